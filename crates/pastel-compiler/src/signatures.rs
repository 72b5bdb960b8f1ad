//! Builtin signature registry.
//!
//! Every [`CoreFunction`] has exactly one row in [`MANIFEST`]:
//!
//! ```text
//! ReturnType NAME(ArgType, ArgType...)
//! ```
//!
//! A trailing `...` marks an argument that may repeat. Single-letter type
//! names are placeholders that are unified per call site. The manifest is
//! parsed with the ordinary type parser the first time it is needed and
//! kept behind a [`OnceLock`], so every compilation unit in the process
//! shares one registry.
//!
//! This module also owns the name tables that map `Core.X`, `Math.x` and
//! builtin methods such as `list.Add` onto core functions.

use std::sync::OnceLock;

use thiserror::Error;
use tracing::debug;

use pastel_core::{CompilationError, CoreFunction, FileId, LexError, PType, ParseError, Span};
use pastel_parser::ast::Namespace;
use pastel_parser::{ParseContext, Parser, TokenCursor, tokenize};

/// Signatures of every builtin, one per line.
pub const MANIFEST: &str = r#"
# Arrays
T ARRAY_GET(Array<T>, int)
string ARRAY_JOIN(Array<string>, string)
int ARRAY_LENGTH(Array<T>)
void ARRAY_SET(Array<T>, int, T)

# Encoding
Array<int> BASE64_TO_BYTES(string)
string BASE64_TO_STRING(string)
string BYTES_TO_BASE64(Array<int>)
string UTF8_BYTES_TO_STRING(Array<int>)

# Conversions
string BOOL_TO_STRING(bool)
string CHAR_TO_STRING(char)
string FLOAT_TO_STRING(double)
string INT_TO_STRING(int)
char CHR(int)
int ORD(char)
bool IS_VALID_INTEGER(string)
double PARSE_FLOAT_UNSAFE(string)
int PARSE_INT(string)
bool TRY_PARSE_FLOAT(string, Array<double>)
string TO_CODE_STRING(string)

# Dictionaries
bool DICTIONARY_CONTAINS_KEY(Dictionary<K, V>, K)
V DICTIONARY_GET(Dictionary<K, V>, K)
Array<K> DICTIONARY_KEYS(Dictionary<K, V>)
Dictionary<K, V> DICTIONARY_NEW()
void DICTIONARY_REMOVE(Dictionary<K, V>, K)
void DICTIONARY_SET(Dictionary<K, V>, K, V)
int DICTIONARY_SIZE(Dictionary<K, V>)
V DICTIONARY_TRY_GET(Dictionary<K, V>, K, V)
Array<V> DICTIONARY_VALUES(Dictionary<K, V>)

# Lists
void LIST_ADD(List<T>, T)
void LIST_CLEAR(List<T>)
List<T> LIST_CONCAT(List<T>, List<T>)
T LIST_GET(List<T>, int)
void LIST_INSERT(List<T>, int, T)
string LIST_JOIN_CHARS(List<char>)
string LIST_JOIN_STRINGS(List<string>, string)
List<T> LIST_NEW()
T LIST_POP(List<T>)
void LIST_REMOVE_AT(List<T>, int)
void LIST_REVERSE(List<T>)
void LIST_SET(List<T>, int, T)
void LIST_SHUFFLE(List<T>)
int LIST_SIZE(List<T>)
Array<T> LIST_TO_ARRAY(List<T>)
List<T> MULTIPLY_LIST(List<T>, int)
Array<int> SORTED_COPY_OF_INT_ARRAY(Array<int>)
Array<string> SORTED_COPY_OF_STRING_ARRAY(Array<string>)

# Math
number MATH_ABS(number)
double MATH_ARCCOS(double)
double MATH_ARCSIN(double)
double MATH_ARCTAN(double, double)
int MATH_CEIL(double)
double MATH_COS(double)
int MATH_FLOOR(double)
double MATH_LOG(double)
double MATH_POW(double, double)
double MATH_SIN(double)
double MATH_TAN(double)
double RANDOM_FLOAT()

# Strings
string STRING_APPEND(string, string)
char STRING_CHAR_AT(string, int)
int STRING_CHAR_CODE_AT(string, int)
bool STRING_COMPARE_IS_REVERSE(string, string)
string STRING_CONCAT_ALL(string...)
bool STRING_CONTAINS(string, string)
bool STRING_ENDS_WITH(string, string)
bool STRING_EQUALS(string, string)
string STRING_FROM_CHAR_CODE(int)
int STRING_INDEX_OF(string, string)
int STRING_LAST_INDEX_OF(string, string)
int STRING_LENGTH(string)
string STRING_REPLACE(string, string, string)
string STRING_REVERSE(string)
Array<string> STRING_SPLIT(string, string)
bool STRING_STARTS_WITH(string, string)
string STRING_SUBSTRING(string, int, int)
bool STRING_SUBSTRING_IS_EQUAL_TO(string, int, string)
string STRING_TO_LOWER(string)
string STRING_TO_UPPER(string)
Array<int> STRING_TO_UTF8_BYTES(string)
string STRING_TRIM(string)
string STRING_TRIM_END(string)
string STRING_TRIM_START(string)

# String builders
void STRINGBUILDER_ADD(StringBuilder, string)
void STRINGBUILDER_CLEAR(StringBuilder)
string STRINGBUILDER_TOSTRING(StringBuilder)

# Host and runtime
double CURRENT_TIME_SECONDS()
void EMIT_COMMENT(string)
object EXTENSIBLE_CALLBACK_INVOKE(string, Array<object>)
object GET_FUNCTION(string)
void PRINT_STDERR(string)
void PRINT_STDOUT(string)
bool STRONG_REFERENCE_EQUALITY(object, object)
"#;

// ============================================================================
// Errors
// ============================================================================

/// A malformed manifest row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("manifest line {line}: {source}")]
    Lex { line: usize, source: LexError },

    #[error("manifest line {line}: {source}")]
    Parse { line: usize, source: ParseError },

    #[error("manifest line {line}: unknown core function '{name}'")]
    UnknownFunction { line: usize, name: String },

    #[error("manifest line {line}: '{name}' is declared twice")]
    Duplicate { line: usize, name: String },

    #[error("manifest line {line}: unexpected text after the signature")]
    TrailingTokens { line: usize },

    #[error("manifest has no signature for '{name}'")]
    Missing { name: String },
}

// ============================================================================
// Registry
// ============================================================================

/// Parallel signature tables indexed by [`CoreFunction::index`].
#[derive(Debug, Clone)]
pub struct SignatureRegistry {
    return_types: Vec<PType>,
    arg_types: Vec<Vec<PType>>,
    repeated: Vec<Vec<bool>>,
}

impl SignatureRegistry {
    /// Parse a manifest. Every core function must appear exactly once.
    pub fn parse(manifest: &str) -> Result<Self, ManifestError> {
        let mut return_types: Vec<Option<PType>> = vec![None; CoreFunction::COUNT];
        let mut arg_types = vec![Vec::new(); CoreFunction::COUNT];
        let mut repeated = vec![Vec::new(); CoreFunction::COUNT];

        for (i, row) in manifest.lines().enumerate() {
            let line = i + 1;
            let row = row.trim();
            if row.is_empty() || row.starts_with('#') {
                continue;
            }

            let (function, signature) = parse_row(row, line)?;
            let slot = function.index();
            if return_types[slot].is_some() {
                return Err(ManifestError::Duplicate {
                    line,
                    name: function.name().to_string(),
                });
            }
            return_types[slot] = Some(signature.return_type);
            arg_types[slot] = signature.arg_types;
            repeated[slot] = signature.repeated;
        }

        let return_types = return_types
            .into_iter()
            .zip(CoreFunction::ALL)
            .map(|(ty, f)| {
                ty.ok_or_else(|| ManifestError::Missing {
                    name: f.name().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            return_types,
            arg_types,
            repeated,
        })
    }

    pub fn return_type(&self, function: CoreFunction) -> &PType {
        &self.return_types[function.index()]
    }

    pub fn arg_types(&self, function: CoreFunction) -> &[PType] {
        &self.arg_types[function.index()]
    }

    /// One flag per declared argument, set where the argument may repeat.
    pub fn repeated_flags(&self, function: CoreFunction) -> &[bool] {
        &self.repeated[function.index()]
    }

    /// Whether the last declared argument absorbs any extra arguments.
    pub fn last_arg_repeats(&self, function: CoreFunction) -> bool {
        self.repeated_flags(function).last().copied().unwrap_or(false)
    }
}

struct RowSignature {
    return_type: PType,
    arg_types: Vec<PType>,
    repeated: Vec<bool>,
}

fn parse_row(row: &str, line: usize) -> Result<(CoreFunction, RowSignature), ManifestError> {
    let lex = |source| ManifestError::Lex { line, source };
    let parse = |source| ManifestError::Parse { line, source };

    let tokens = tokenize(row, FileId(0)).map_err(lex)?;
    let mut context = ParseContext::new();
    let mut parser = Parser::new(TokenCursor::new(tokens), &mut context);

    let return_type = parser.parse_type().map_err(parse)?;
    let name = parser.tokens_mut().pop_word().map_err(parse)?;
    let function = CoreFunction::from_name(&name.text).ok_or_else(|| {
        ManifestError::UnknownFunction {
            line,
            name: name.text.clone(),
        }
    })?;

    parser.tokens_mut().pop_expected("(").map_err(parse)?;
    let mut arg_types = Vec::new();
    let mut repeated = Vec::new();
    while !parser.tokens_mut().pop_if_present(")") {
        if !arg_types.is_empty() {
            parser.tokens_mut().pop_expected(",").map_err(parse)?;
        }
        arg_types.push(parser.parse_type().map_err(parse)?);
        let dots = parser.tokens_mut().pop_if_present(".");
        if dots {
            parser.tokens_mut().pop_expected(".").map_err(parse)?;
            parser.tokens_mut().pop_expected(".").map_err(parse)?;
        }
        repeated.push(dots);
    }

    if !parser.is_done() {
        return Err(ManifestError::TrailingTokens { line });
    }

    Ok((
        function,
        RowSignature {
            return_type,
            arg_types,
            repeated,
        },
    ))
}

static REGISTRY: OnceLock<Result<SignatureRegistry, ManifestError>> = OnceLock::new();

/// The process-wide registry, parsed from [`MANIFEST`] on first use.
pub fn signatures() -> Result<&'static SignatureRegistry, &'static ManifestError> {
    REGISTRY
        .get_or_init(|| {
            let registry = SignatureRegistry::parse(MANIFEST);
            debug!(ok = registry.is_ok(), "core function manifest parsed");
            registry
        })
        .as_ref()
}

/// The registry, with a manifest failure reported at `span`.
pub(crate) fn registry_at(span: Span) -> Result<&'static SignatureRegistry, CompilationError> {
    signatures().map_err(|e| CompilationError::other(span, e.to_string()))
}

// ============================================================================
// Name tables
// ============================================================================

/// Resolve `Core.X` or `Math.x`.
///
/// `Math` uses lower camel case. `Core` carries the same math functions
/// with a leading capital, for older code.
pub fn namespace_function(namespace: Namespace, name: &str) -> Option<CoreFunction> {
    use CoreFunction::*;
    match namespace {
        Namespace::Math => Some(match name {
            "abs" => MathAbs,
            "arcCos" => MathArcCos,
            "arcSin" => MathArcSin,
            "arcTan" => MathArcTan,
            "ceil" => MathCeil,
            "cos" => MathCos,
            "floor" => MathFloor,
            "log" => MathLog,
            "pow" => MathPow,
            "sin" => MathSin,
            "tan" => MathTan,
            _ => return None,
        }),
        Namespace::Core => Some(match name {
            "Abs" => MathAbs,
            "ArcCos" => MathArcCos,
            "ArcSin" => MathArcSin,
            "ArcTan" => MathArcTan,
            "Ceil" => MathCeil,
            "Cos" => MathCos,
            "Floor" => MathFloor,
            "Log" => MathLog,
            "Pow" => MathPow,
            "Sin" => MathSin,
            "Tan" => MathTan,
            "Base64ToBytes" => Base64ToBytes,
            "Base64ToString" => Base64ToString,
            "BoolToString" => BoolToString,
            "BytesToBase64" => BytesToBase64,
            "CharToString" => CharToString,
            "Chr" => Chr,
            "CurrentTimeSeconds" => CurrentTimeSeconds,
            "EmitComment" => EmitComment,
            "ExtensibleCallbackInvoke" => ExtensibleCallbackInvoke,
            "FloatToString" => FloatToString,
            "IntToString" => IntToString,
            "IsValidInteger" => IsValidInteger,
            "ListConcat" => ListConcat,
            "ListToArray" => ListToArray,
            "MultiplyList" => MultiplyList,
            "Ord" => Ord,
            "ParseFloatUnsafe" => ParseFloatUnsafe,
            "ParseInt" => ParseInt,
            "PrintStdErr" => PrintStderr,
            "PrintStdOut" => PrintStdout,
            "RandomFloat" => RandomFloat,
            "SortedCopyOfIntArray" => SortedCopyOfIntArray,
            "SortedCopyOfStringArray" => SortedCopyOfStringArray,
            "StringAppend" => StringAppend,
            "StringCompareIsReverse" => StringCompareIsReverse,
            "StringEquals" => StringEquals,
            "StringFromCharCode" => StringFromCharCode,
            "StrongReferenceEquality" => StrongReferenceEquality,
            "ToCodeString" => ToCodeString,
            "TryParseFloat" => TryParseFloat,
            "Utf8BytesToString" => Utf8BytesToString,
            _ => return None,
        }),
        Namespace::Extension => None,
    }
}

/// Resolve a method called on a value of a builtin type.
///
/// `span` positions the error for an unknown method.
pub fn builtin_method(
    receiver: &PType,
    method: &str,
    span: Span,
) -> Result<CoreFunction, CompilationError> {
    use CoreFunction::*;

    let unknown = |owner: &str| -> Result<CoreFunction, CompilationError> {
        Err(CompilationError::UnknownField {
            field: method.to_string(),
            message: format!("Unresolved {owner} method: {method}"),
            span,
        })
    };

    match receiver.root().as_str() {
        "string" => Ok(match method {
            "CharCodeAt" => StringCharCodeAt,
            "Contains" => StringContains,
            "EndsWith" => StringEndsWith,
            "IndexOf" => StringIndexOf,
            "LastIndexOf" => StringLastIndexOf,
            "Length" => {
                return Err(CompilationError::UnknownField {
                    field: method.to_string(),
                    message: "String uses .Size() for its length.".to_string(),
                    span,
                });
            }
            "Replace" => StringReplace,
            "Reverse" => StringReverse,
            "Size" => StringLength,
            "Split" => StringSplit,
            "StartsWith" => StringStartsWith,
            "SubString" => StringSubstring,
            "SubStringIsEqualTo" => StringSubstringIsEqualTo,
            "ToLower" => StringToLower,
            "ToUpper" => StringToUpper,
            "ToUtf8Bytes" => StringToUtf8Bytes,
            "Trim" => StringTrim,
            "TrimEnd" => StringTrimEnd,
            "TrimStart" => StringTrimStart,
            _ => return unknown("string"),
        }),
        "Array" => Ok(match method {
            "Join" => ArrayJoin,
            "Length" | "Size" => ArrayLength,
            _ => return unknown("Array"),
        }),
        "List" => Ok(match method {
            "Add" => ListAdd,
            "Clear" => ListClear,
            "Insert" => ListInsert,
            "Join" => {
                let item = receiver
                    .generics()
                    .first()
                    .map(PType::root)
                    .unwrap_or_default();
                match item.as_str() {
                    "string" => ListJoinStrings,
                    "char" => ListJoinChars,
                    _ => return unknown(&format!("List<{item}>")),
                }
            }
            "Pop" => ListPop,
            "RemoveAt" => ListRemoveAt,
            "Reverse" => ListReverse,
            "Shuffle" => ListShuffle,
            "Size" => ListSize,
            _ => return unknown("List"),
        }),
        "Dictionary" => Ok(match method {
            "Add" => {
                return Err(CompilationError::UnknownField {
                    field: method.to_string(),
                    message: "Use bracket notation instead of .Add() to add values to a dictionary."
                        .to_string(),
                    span,
                });
            }
            "Contains" => DictionaryContainsKey,
            "Keys" => DictionaryKeys,
            "Remove" => DictionaryRemove,
            "Size" => DictionarySize,
            "TryGet" => DictionaryTryGet,
            "Values" => DictionaryValues,
            _ => return unknown("Dictionary"),
        }),
        "StringBuilder" => Ok(match method {
            "Add" => StringBuilderAdd,
            "Clear" => StringBuilderClear,
            "ToString" => StringBuilderToString,
            _ => return unknown("StringBuilder"),
        }),
        _ => Err(CompilationError::UnknownField {
            field: method.to_string(),
            message: "Unresolved field.".to_string(),
            span,
        }),
    }
}
