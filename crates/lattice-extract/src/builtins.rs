//! Per-language builtin and common-method deny-sets.
//!
//! Extractors filter these names out of `calls`, `type_refs`, and
//! `decorators` so the graph only links names that can actually resolve
//! to project entities.

use std::collections::HashSet;
use std::sync::LazyLock;

macro_rules! name_set {
    ($(#[$meta:meta])* $name:ident = [$($s:literal),* $(,)?]) => {
        $(#[$meta])*
        pub static $name: LazyLock<HashSet<&'static str>> =
            LazyLock::new(|| HashSet::from([$($s),*]));
    };
}

// ── Python ──────────────────────────────────────────────────────────────────

name_set! {
    /// Keywords, constants, builtin functions, and common exception types.
    PY_BUILTINS = [
        "self", "cls", "None", "True", "False",
        "print", "len", "range", "str", "int", "float", "bool", "list", "dict",
        "set", "tuple", "type", "isinstance", "issubclass", "super", "property",
        "staticmethod", "classmethod", "enumerate", "zip", "map", "filter",
        "sorted", "reversed", "any", "all", "min", "max", "sum", "abs",
        "open", "input", "repr", "hash", "id", "dir", "vars", "getattr",
        "setattr", "hasattr", "delattr", "callable", "iter", "next", "hex",
        "oct", "bin", "ord", "chr", "format", "round", "pow", "divmod",
        "object", "Exception", "ValueError", "TypeError", "KeyError",
        "IndexError", "AttributeError", "RuntimeError", "StopIteration",
        "NotImplementedError", "OSError", "IOError", "FileNotFoundError",
        "ImportError", "NameError", "ZeroDivisionError", "AssertionError",
        "breakpoint", "compile", "eval", "exec", "globals", "locals",
        "__import__", "__name__", "__file__", "__init__",
    ]
}

name_set! {
    /// Method names on builtin types that would create false cross-file
    /// edges when called through an untyped receiver.
    PY_COMMON_ATTR_METHODS = [
        "get", "set", "add", "pop", "push", "put",
        "append", "extend", "insert", "remove", "clear", "copy", "update",
        "keys", "values", "items", "setdefault",
        "format", "strip", "rstrip", "lstrip", "split", "join",
        "replace", "find", "index", "count", "startswith", "endswith",
        "encode", "decode", "lower", "upper", "title", "capitalize",
        "read", "write", "close", "flush", "seek",
        "sort", "reverse",
        "send", "throw",
        "debug", "info", "warning", "error", "critical", "exception",
        "raise_for_status", "post", "patch", "delete", "head", "options",
        "execute", "fetchone", "fetchall", "fetchmany", "commit", "rollback",
        "select", "where", "filter", "order_by", "group_by", "limit", "offset",
        "eq", "ne", "gt", "lt", "gte", "lte", "like", "ilike",
        "table", "upsert",
        "dumps", "loads", "model_dump", "model_validate", "dict", "json",
        "isoformat", "strftime", "strptime", "timestamp", "date", "time",
        "now", "utcnow", "today", "fromtimestamp", "fromisoformat",
        "get_json", "assert_called", "assert_called_once", "assert_called_with",
        "assert_not_called", "assert_called_once_with",
        "exists", "mkdir", "rmdir", "unlink", "rename", "resolve",
        "is_file", "is_dir", "iterdir", "glob", "stat",
        "run", "start", "stop", "wait", "sleep", "acquire", "release",
        "match", "search", "sub", "findall",
        "invoke", "dispatch", "emit", "listen",
    ]
}

name_set! {
    /// Python standard-library top-level module names; calls through
    /// these receivers are filtered during extraction.
    PY_STDLIB_MODULES = [
        "abc", "argparse", "array", "ast", "asyncio", "atexit",
        "base64", "binascii", "bisect", "builtins",
        "calendar", "cgi", "cgitb", "codecs", "collections", "colorsys",
        "compileall", "concurrent", "configparser", "contextlib", "contextvars",
        "copy", "copyreg", "csv", "ctypes", "curses",
        "dataclasses", "datetime", "dbm", "decimal", "difflib", "dis",
        "distutils", "doctest",
        "email", "encodings", "enum", "errno",
        "faulthandler", "fcntl", "filecmp", "fileinput", "fnmatch",
        "fractions", "ftplib", "functools",
        "gc", "getpass", "gettext", "glob", "grp", "gzip",
        "hashlib", "heapq", "hmac", "html", "http",
        "imaplib", "importlib", "inspect", "io", "ipaddress", "itertools",
        "json",
        "keyword",
        "linecache", "locale", "logging", "lzma",
        "mailbox", "math", "mimetypes", "mmap", "multiprocessing",
        "netrc", "numbers",
        "operator", "os", "ossaudiodev",
        "pathlib", "pdb", "pickle", "pickletools", "pipes", "pkgutil",
        "platform", "plistlib", "poplib", "posixpath", "pprint",
        "profile", "pstats", "pty", "pwd", "py_compile", "pydoc",
        "queue",
        "random", "re", "readline", "reprlib", "resource", "rlcompleter",
        "runpy",
        "sched", "secrets", "select", "selectors", "shelve", "shlex",
        "shutil", "signal", "site", "smtplib", "socket", "socketserver",
        "sqlite3", "ssl", "stat", "statistics", "string", "stringprep",
        "struct", "subprocess", "sunau", "symtable", "sys", "sysconfig",
        "syslog",
        "tabnanny", "tarfile", "tempfile", "termios", "test", "textwrap",
        "threading", "time", "timeit", "tkinter", "token", "tokenize",
        "tomllib", "trace", "traceback", "tracemalloc", "tty", "turtle",
        "types", "typing",
        "unicodedata", "unittest", "urllib", "uuid",
        "venv",
        "warnings", "wave", "weakref", "webbrowser",
        "xml", "xmlrpc",
        "zipfile", "zipimport", "zlib",
        "_thread", "_io", "_collections_abc",
    ]
}

name_set! {
    /// Common third-party packages that will never appear in the graph.
    PY_EXTERNAL_PACKAGES = [
        "aiohttp", "aiofiles", "aiomysql", "aiopg", "aiosqlite",
        "anthropic", "anyio",
        "bcrypt", "beautifulsoup4", "boto3", "botocore",
        "celery", "certifi", "cffi", "charset_normalizer", "click",
        "cryptography",
        "databases", "django", "docker", "dotenv",
        "elasticsearch",
        "faker", "fastapi", "flask", "freezegun",
        "gevent", "google", "grpc", "gunicorn",
        "httpcore", "httpx",
        "jinja2",
        "kombu",
        "loguru",
        "marshmallow", "motor", "msgpack", "mypy",
        "numpy",
        "openai",
        "pandas", "paramiko", "pillow", "psycopg2", "pydantic",
        "pymongo", "pytest", "pytz",
        "redis", "requests", "respx", "rich", "ruff",
        "scipy", "sentry_sdk", "setuptools", "sklearn", "sniffio",
        "sqlalchemy", "starlette", "stripe", "supabase",
        "tenacity", "toml", "torch", "tortoise", "trio", "twilio",
        "ujson", "uvicorn", "uvloop",
        "websockets",
        "yaml",
    ]
}

name_set! {
    /// Builtin and typing-construct names excluded from `type_refs`.
    PY_TYPE_BUILTINS = [
        "str", "int", "float", "bool", "list", "dict", "set", "tuple",
        "None", "bytes", "complex", "object", "type",
        "Any", "Optional", "List", "Dict", "Set", "Tuple", "Union", "Type",
        "Callable", "Iterator", "Generator", "Sequence", "Mapping",
        "FrozenSet", "Deque", "DefaultDict", "OrderedDict", "Counter",
        "ClassVar", "Final", "Literal", "TypeVar", "Protocol",
    ]
}

name_set! {
    /// Standard decorators carrying no cross-entity link value.
    PY_STANDARD_DECORATORS = [
        "staticmethod", "classmethod", "property", "abstractmethod",
        "override", "overload", "final", "cached_property", "wraps",
        "dataclass", "total_ordering", "lru_cache", "cache",
        "contextmanager", "asynccontextmanager", "runtime_checkable",
    ]
}

// ── TypeScript / JavaScript ─────────────────────────────────────────────────

name_set! {
    TS_BUILTINS = [
        "console", "window", "document", "navigator", "location", "history",
        "Math", "JSON", "Date", "RegExp", "Error", "Symbol", "Proxy", "Reflect",
        "Promise", "Array", "Map", "Set", "WeakMap", "WeakSet", "WeakRef",
        "Object", "Function", "Number", "String", "Boolean",
        "Int8Array", "Uint8Array", "Float32Array", "Float64Array",
        "ArrayBuffer", "SharedArrayBuffer", "DataView",
        "BigInt", "BigInt64Array", "BigUint64Array",
        "parseInt", "parseFloat", "isNaN", "isFinite", "encodeURI",
        "decodeURI", "encodeURIComponent", "decodeURIComponent",
        "setTimeout", "setInterval", "clearTimeout", "clearInterval",
        "requestAnimationFrame", "cancelAnimationFrame",
        "fetch", "alert", "confirm", "prompt", "atob", "btoa",
        "require", "module", "exports", "process", "Buffer", "global",
        "__dirname", "__filename",
        "undefined", "null", "NaN", "Infinity", "this", "super",
        "true", "false", "void", "typeof", "instanceof", "new", "delete",
        "Record", "Partial", "Required", "Readonly", "Pick", "Omit",
        "Exclude", "Extract", "NonNullable", "ReturnType", "Parameters",
        "ConstructorParameters", "InstanceType", "ThisParameterType",
        "Awaited", "Uppercase", "Lowercase", "Capitalize", "Uncapitalize",
        "keyof", "infer", "extends", "implements",
    ]
}

name_set! {
    TS_COMMON_METHODS = [
        "push", "pop", "shift", "unshift", "splice", "slice", "concat",
        "map", "filter", "reduce", "forEach", "find", "findIndex", "some",
        "every", "includes", "indexOf", "lastIndexOf", "flat", "flatMap",
        "sort", "reverse", "fill", "copyWithin", "entries", "keys", "values",
        "charAt", "charCodeAt", "split", "join", "replace", "replaceAll",
        "trim", "trimStart", "trimEnd", "padStart", "padEnd",
        "startsWith", "endsWith", "match", "search", "substring",
        "toLowerCase", "toUpperCase", "repeat", "normalize",
        "hasOwnProperty", "toString", "valueOf", "toJSON",
        "get", "set", "has", "delete", "clear", "add", "size",
        "then", "catch", "finally", "all", "race", "allSettled", "any",
        "resolve", "reject",
        "log", "warn", "error", "info", "debug", "trace", "table", "dir",
        "getElementById", "querySelector", "querySelectorAll",
        "addEventListener", "removeEventListener", "createElement",
        "appendChild", "removeChild", "setAttribute", "getAttribute",
        "preventDefault", "stopPropagation",
        "parse", "stringify",
        "bind", "call", "apply", "next", "return", "throw",
        "emit", "on", "once", "off",
    ]
}

name_set! {
    /// Type-position builtins excluded from TS `type_refs`.
    TS_TYPE_BUILTINS = [
        "string", "number", "boolean", "void", "any", "unknown", "never",
        "null", "undefined", "object", "symbol", "bigint",
        "Promise", "Array", "Map", "Set", "Record", "Partial", "Required",
        "Readonly", "Pick", "Omit", "Exclude", "Extract", "NonNullable",
        "ReturnType", "Parameters", "InstanceType", "Awaited",
        "Iterable", "Iterator", "AsyncIterable", "AsyncIterator",
        "Generator", "AsyncGenerator", "IterableIterator",
        "ReadonlyArray", "ReadonlyMap", "ReadonlySet",
        "Function", "Object", "Number", "String", "Boolean", "Error",
        "Date", "RegExp", "Symbol", "Buffer",
        "HTMLElement", "Element", "Node", "Event", "EventTarget",
        "JSX", "React", "ReactNode", "ReactElement",
        "T", "K", "V", "U", "P", "R",
    ]
}

// ── Rust ────────────────────────────────────────────────────────────────────

name_set! {
    RUST_BUILTINS = [
        "println", "eprintln", "print", "eprint", "dbg",
        "format", "write", "writeln",
        "vec", "panic", "todo", "unimplemented", "unreachable",
        "assert", "assert_eq", "assert_ne", "debug_assert",
        "cfg", "env", "include", "include_str", "include_bytes",
        "concat", "stringify", "line", "column", "file", "module_path",
        "bool", "char", "str", "i8", "i16", "i32", "i64", "i128", "isize",
        "u8", "u16", "u32", "u64", "u128", "usize", "f32", "f64",
        "Box", "Vec", "String", "Option", "Result",
        "Some", "None", "Ok", "Err",
        "Clone", "Copy", "Send", "Sync", "Sized", "Unpin",
        "Drop", "Default", "Debug", "Display",
        "Fn", "FnMut", "FnOnce",
        "Iterator", "IntoIterator", "ExactSizeIterator",
        "From", "Into", "TryFrom", "TryInto",
        "AsRef", "AsMut", "Borrow", "BorrowMut",
        "Eq", "PartialEq", "Ord", "PartialOrd", "Hash",
        "Add", "Sub", "Mul", "Div", "Rem", "Neg", "Not",
        "Deref", "DerefMut", "Index", "IndexMut",
        "Read", "Write", "Seek", "BufRead",
        "ToOwned", "ToString",
        "self", "Self", "crate", "super", "pub", "mod",
        "let", "mut", "const", "static", "ref", "move",
        "async", "await", "unsafe", "extern", "dyn",
        "true", "false",
        "std", "core", "alloc", "collections",
        "io", "fs", "path", "net", "sync", "thread",
        "fmt", "mem", "ptr", "ops", "iter", "num",
        "rc", "arc", "cell", "once",
        "HashMap", "HashSet", "BTreeMap", "BTreeSet", "VecDeque", "LinkedList",
        "Arc", "Rc", "Mutex", "RwLock", "Cell", "RefCell",
        "Pin", "Waker", "Future", "Poll",
        "Path", "PathBuf", "OsStr", "OsString",
        "Cow", "PhantomData",
    ]
}

name_set! {
    RUST_COMMON_METHODS = [
        "new", "default", "clone", "to_string", "to_owned",
        "unwrap", "expect", "unwrap_or", "unwrap_or_else", "unwrap_or_default",
        "is_some", "is_none", "is_ok", "is_err",
        "map", "and_then", "or_else", "map_err", "ok", "err",
        "as_ref", "as_mut", "as_str", "as_bytes", "as_slice",
        "into", "from", "try_into", "try_from",
        "iter", "into_iter", "iter_mut",
        "collect", "filter", "fold", "for_each", "any", "all",
        "find", "position", "enumerate", "zip", "chain", "take", "skip",
        "len", "is_empty", "contains", "push", "pop", "insert", "remove",
        "get", "get_mut", "entry", "or_insert", "or_default",
        "read", "write", "flush", "close",
        "lock", "unlock", "try_lock",
        "fmt", "eq", "ne", "cmp", "partial_cmp", "hash",
        "with_capacity", "capacity", "reserve", "shrink_to_fit",
        "extend", "drain", "retain", "clear", "truncate",
        "join", "split", "trim", "starts_with", "ends_with", "replace",
        "borrow", "borrow_mut", "deref", "deref_mut",
    ]
}

name_set! {
    /// Standard attributes excluded from Rust `decorators`.
    RUST_STANDARD_ATTRS = [
        "derive", "cfg", "cfg_attr", "allow", "warn", "deny", "forbid",
        "inline", "test", "doc", "must_use", "non_exhaustive", "repr",
        "macro_export", "macro_use", "ignore", "should_panic", "track_caller",
    ]
}

// ── C ───────────────────────────────────────────────────────────────────────

name_set! {
    C_BUILTINS = [
        "printf", "scanf", "fprintf", "fscanf", "sprintf", "snprintf",
        "puts", "gets", "getchar", "putchar", "fgets", "fputs",
        "fopen", "fclose", "fread", "fwrite", "fseek", "ftell", "rewind",
        "fflush", "feof", "ferror", "clearerr", "perror",
        "malloc", "calloc", "realloc", "free",
        "memcpy", "memmove", "memset", "memcmp",
        "strlen", "strcpy", "strncpy", "strcat", "strncat",
        "strcmp", "strncmp", "strchr", "strrchr", "strstr", "strtok",
        "atoi", "atol", "atof", "strtol", "strtoul", "strtod",
        "sizeof", "offsetof", "assert", "static_assert",
        "abs", "labs", "div", "ldiv",
        "rand", "srand", "time", "clock", "difftime",
        "exit", "abort", "atexit", "system", "getenv",
        "qsort", "bsearch",
        "int", "long", "short", "char", "float", "double", "void",
        "unsigned", "signed", "const", "volatile", "static", "extern",
        "struct", "union", "enum", "typedef",
        "size_t", "ptrdiff_t", "NULL", "EOF",
        "int8_t", "int16_t", "int32_t", "int64_t",
        "uint8_t", "uint16_t", "uint32_t", "uint64_t",
        "bool", "true", "false",
        "sin", "cos", "tan", "sqrt", "pow", "log", "exp", "floor", "ceil",
        "fabs", "fmod",
    ]
}

name_set! {
    /// C has no methods.
    C_COMMON_METHODS = []
}

// ── C++ ─────────────────────────────────────────────────────────────────────

name_set! {
    CPP_BUILTINS = [
        "std", "cout", "cin", "cerr", "clog", "endl",
        "printf", "scanf", "fprintf", "fscanf", "sprintf", "snprintf",
        "puts", "gets", "getchar", "putchar",
        "malloc", "calloc", "realloc", "free", "new", "delete",
        "sizeof", "alignof", "offsetof",
        "string", "wstring", "to_string", "stoi", "stol", "stof", "stod",
        "strlen", "strcpy", "strncpy", "strcat", "strncat", "strcmp", "strncmp",
        "memcpy", "memmove", "memset", "memcmp",
        "vector", "map", "unordered_map", "set", "unordered_set",
        "list", "deque", "queue", "stack", "priority_queue",
        "array", "pair", "tuple", "optional", "variant", "any",
        "shared_ptr", "unique_ptr", "weak_ptr", "make_shared", "make_unique",
        "move", "forward", "swap", "exchange",
        "min", "max", "abs", "sort", "find", "count",
        "begin", "end", "size", "empty",
        "static_cast", "dynamic_cast", "const_cast", "reinterpret_cast",
        "int", "long", "short", "char", "float", "double", "bool", "void",
        "unsigned", "signed", "size_t", "ptrdiff_t", "nullptr", "NULL",
        "int8_t", "int16_t", "int32_t", "int64_t",
        "uint8_t", "uint16_t", "uint32_t", "uint64_t",
        "auto", "decltype", "constexpr",
        "assert", "static_assert",
        "this", "true", "false", "class", "struct", "enum",
        "public", "private", "protected", "virtual", "override", "final",
        "const", "volatile", "mutable", "inline", "explicit",
        "namespace", "using", "typedef", "template", "typename",
        "try", "catch", "throw", "noexcept",
        "exception", "runtime_error", "logic_error", "invalid_argument",
        "out_of_range", "overflow_error", "underflow_error",
        "thread", "mutex", "lock_guard", "unique_lock", "condition_variable",
        "atomic", "future", "promise", "async",
        "function", "bind", "ref", "cref",
        "for_each", "transform", "accumulate", "reduce",
    ]
}

name_set! {
    CPP_COMMON_METHODS = [
        "push_back", "pop_back", "emplace_back", "emplace",
        "insert", "erase", "clear", "resize", "reserve",
        "front", "back", "at", "data",
        "begin", "end", "cbegin", "cend", "rbegin", "rend",
        "size", "empty", "capacity", "max_size",
        "find", "count", "contains", "lower_bound", "upper_bound",
        "first", "second", "get",
        "push", "pop", "top",
        "open", "close", "read", "write", "flush", "seekg", "seekp",
        "str", "c_str", "substr", "append", "replace", "compare",
        "length", "rfind", "find_first_of", "find_last_of",
        "lock", "unlock", "try_lock",
        "wait", "notify_one", "notify_all",
        "load", "store", "exchange", "compare_exchange_strong",
        "reset", "release", "swap",
        "what", "code", "message",
    ]
}

// ── Java ────────────────────────────────────────────────────────────────────

name_set! {
    JAVA_BUILTINS = [
        "System", "String", "Integer", "Long", "Double", "Float",
        "Boolean", "Character", "Byte", "Short",
        "Object", "Class", "Enum",
        "Math", "StrictMath",
        "Thread", "Runnable",
        "Collections", "Arrays",
        "List", "ArrayList", "LinkedList",
        "Map", "HashMap", "TreeMap", "LinkedHashMap", "ConcurrentHashMap",
        "Set", "HashSet", "TreeSet", "LinkedHashSet",
        "Queue", "Deque", "ArrayDeque", "PriorityQueue",
        "Stack", "Vector",
        "Optional", "Stream", "Collectors",
        "CompletableFuture", "Future",
        "Consumer", "Supplier", "Function", "Predicate", "BiFunction",
        "File", "Path", "Paths", "Files",
        "InputStream", "OutputStream", "Reader", "Writer",
        "BufferedReader", "BufferedWriter", "PrintWriter",
        "Scanner",
        "Exception", "RuntimeException", "Error",
        "NullPointerException", "IllegalArgumentException",
        "IllegalStateException", "UnsupportedOperationException",
        "IndexOutOfBoundsException", "ClassNotFoundException",
        "IOException", "FileNotFoundException",
        "Override", "Deprecated", "SuppressWarnings", "FunctionalInterface",
        "this", "super", "null", "true", "false",
        "void", "int", "long", "double", "float", "boolean", "char",
        "byte", "short", "var",
    ]
}

name_set! {
    JAVA_COMMON_METHODS = [
        "toString", "equals", "hashCode", "getClass", "clone", "finalize",
        "wait", "notify", "notifyAll", "compareTo",
        "add", "remove", "get", "set", "put", "contains", "containsKey",
        "containsValue", "size", "isEmpty", "clear", "iterator",
        "toArray", "addAll", "removeAll", "retainAll",
        "keySet", "values", "entrySet",
        "stream", "parallelStream", "of", "map", "filter", "reduce",
        "collect", "forEach", "flatMap", "sorted", "distinct",
        "limit", "skip", "count", "findFirst", "findAny",
        "anyMatch", "allMatch", "noneMatch",
        "toList", "toSet", "toMap", "joining", "groupingBy",
        "length", "charAt", "substring", "indexOf", "lastIndexOf",
        "trim", "strip", "split", "replace", "replaceAll",
        "startsWith", "endsWith", "matches",
        "toLowerCase", "toUpperCase", "format", "valueOf",
        "isPresent", "orElse", "orElseGet", "orElseThrow",
        "ifPresent", "ifPresentOrElse",
        "read", "write", "close", "flush", "print", "println",
        "readLine", "append", "delete",
        "build", "builder",
        "info", "debug", "warn", "error", "trace",
        "run", "start", "stop", "execute", "call",
        "getName", "setName", "getType", "getId",
    ]
}

name_set! {
    /// Type-position builtins excluded from Java `type_refs`.
    JAVA_TYPE_BUILTINS = [
        "String", "Integer", "Long", "Double", "Float", "Boolean",
        "Character", "Byte", "Short", "Object", "Class", "Enum",
        "List", "Map", "Set", "Collection", "Iterable", "Iterator",
        "Optional", "Stream", "Comparable", "Serializable", "Cloneable",
        "Runnable", "Callable", "Future", "CompletableFuture",
        "Consumer", "Supplier", "Function", "Predicate", "BiFunction",
        "Exception", "RuntimeException", "Error", "Throwable",
        "Override", "Deprecated",
        "T", "K", "V", "E", "R",
    ]
}

name_set! {
    /// Standard annotations excluded from Java `decorators`.
    JAVA_STANDARD_ANNOTATIONS = [
        "Override", "Deprecated", "SuppressWarnings",
        "FunctionalInterface", "SafeVarargs",
    ]
}
