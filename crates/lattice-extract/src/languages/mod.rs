//! Language extractors: one full-AST reference front end (Python) and
//! six regex-based front ends.

pub mod c;
pub mod cpp;
pub mod java;
pub mod javascript;
pub mod python;
pub mod recovery;
pub mod rust;
pub mod typescript;

pub use c::CExtractor;
pub use cpp::CppExtractor;
pub use java::JavaExtractor;
pub use javascript::JavaScriptExtractor;
pub use python::PythonExtractor;
pub use rust::RustExtractor;
pub use typescript::TypeScriptExtractor;
