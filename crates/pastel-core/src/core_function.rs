//! Identifiers for the builtin core functions.
//!
//! Every builtin a Pastel program can call (directly through `Core.X` /
//! `Math.X`, or indirectly through a method on a builtin type or a lowered
//! operator) has one [`CoreFunction`] id. The id is a dense `u16`, so the
//! signature registry can store its tables as plain vectors indexed by it.

use num_enum::{IntoPrimitive, TryFromPrimitive};

macro_rules! core_functions {
    ($($variant:ident => $name:literal,)*) => {
        /// A builtin core function.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
        )]
        #[repr(u16)]
        pub enum CoreFunction {
            $($variant,)*
        }

        impl CoreFunction {
            /// Every core function, in id order.
            pub const ALL: &'static [CoreFunction] = &[$(CoreFunction::$variant,)*];

            /// The manifest name, e.g. `LIST_GET`.
            pub fn name(self) -> &'static str {
                match self {
                    $(CoreFunction::$variant => $name,)*
                }
            }

            /// Look up a core function by its manifest name.
            pub fn from_name(name: &str) -> Option<CoreFunction> {
                match name {
                    $($name => Some(CoreFunction::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

core_functions! {
    ArrayGet => "ARRAY_GET",
    ArrayJoin => "ARRAY_JOIN",
    ArrayLength => "ARRAY_LENGTH",
    ArraySet => "ARRAY_SET",
    Base64ToBytes => "BASE64_TO_BYTES",
    Base64ToString => "BASE64_TO_STRING",
    BoolToString => "BOOL_TO_STRING",
    BytesToBase64 => "BYTES_TO_BASE64",
    CharToString => "CHAR_TO_STRING",
    Chr => "CHR",
    CurrentTimeSeconds => "CURRENT_TIME_SECONDS",
    DictionaryContainsKey => "DICTIONARY_CONTAINS_KEY",
    DictionaryGet => "DICTIONARY_GET",
    DictionaryKeys => "DICTIONARY_KEYS",
    DictionaryNew => "DICTIONARY_NEW",
    DictionaryRemove => "DICTIONARY_REMOVE",
    DictionarySet => "DICTIONARY_SET",
    DictionarySize => "DICTIONARY_SIZE",
    DictionaryTryGet => "DICTIONARY_TRY_GET",
    DictionaryValues => "DICTIONARY_VALUES",
    EmitComment => "EMIT_COMMENT",
    ExtensibleCallbackInvoke => "EXTENSIBLE_CALLBACK_INVOKE",
    FloatToString => "FLOAT_TO_STRING",
    GetFunction => "GET_FUNCTION",
    IntToString => "INT_TO_STRING",
    IsValidInteger => "IS_VALID_INTEGER",
    ListAdd => "LIST_ADD",
    ListClear => "LIST_CLEAR",
    ListConcat => "LIST_CONCAT",
    ListGet => "LIST_GET",
    ListInsert => "LIST_INSERT",
    ListJoinChars => "LIST_JOIN_CHARS",
    ListJoinStrings => "LIST_JOIN_STRINGS",
    ListNew => "LIST_NEW",
    ListPop => "LIST_POP",
    ListRemoveAt => "LIST_REMOVE_AT",
    ListReverse => "LIST_REVERSE",
    ListSet => "LIST_SET",
    ListShuffle => "LIST_SHUFFLE",
    ListSize => "LIST_SIZE",
    ListToArray => "LIST_TO_ARRAY",
    MathAbs => "MATH_ABS",
    MathArcCos => "MATH_ARCCOS",
    MathArcSin => "MATH_ARCSIN",
    MathArcTan => "MATH_ARCTAN",
    MathCeil => "MATH_CEIL",
    MathCos => "MATH_COS",
    MathFloor => "MATH_FLOOR",
    MathLog => "MATH_LOG",
    MathPow => "MATH_POW",
    MathSin => "MATH_SIN",
    MathTan => "MATH_TAN",
    MultiplyList => "MULTIPLY_LIST",
    Ord => "ORD",
    ParseFloatUnsafe => "PARSE_FLOAT_UNSAFE",
    ParseInt => "PARSE_INT",
    PrintStderr => "PRINT_STDERR",
    PrintStdout => "PRINT_STDOUT",
    RandomFloat => "RANDOM_FLOAT",
    SortedCopyOfIntArray => "SORTED_COPY_OF_INT_ARRAY",
    SortedCopyOfStringArray => "SORTED_COPY_OF_STRING_ARRAY",
    StringAppend => "STRING_APPEND",
    StringCharAt => "STRING_CHAR_AT",
    StringCharCodeAt => "STRING_CHAR_CODE_AT",
    StringCompareIsReverse => "STRING_COMPARE_IS_REVERSE",
    StringConcatAll => "STRING_CONCAT_ALL",
    StringContains => "STRING_CONTAINS",
    StringEndsWith => "STRING_ENDS_WITH",
    StringEquals => "STRING_EQUALS",
    StringFromCharCode => "STRING_FROM_CHAR_CODE",
    StringIndexOf => "STRING_INDEX_OF",
    StringLastIndexOf => "STRING_LAST_INDEX_OF",
    StringLength => "STRING_LENGTH",
    StringReplace => "STRING_REPLACE",
    StringReverse => "STRING_REVERSE",
    StringSplit => "STRING_SPLIT",
    StringStartsWith => "STRING_STARTS_WITH",
    StringSubstring => "STRING_SUBSTRING",
    StringSubstringIsEqualTo => "STRING_SUBSTRING_IS_EQUAL_TO",
    StringToLower => "STRING_TO_LOWER",
    StringToUpper => "STRING_TO_UPPER",
    StringToUtf8Bytes => "STRING_TO_UTF8_BYTES",
    StringTrim => "STRING_TRIM",
    StringTrimEnd => "STRING_TRIM_END",
    StringTrimStart => "STRING_TRIM_START",
    StringBuilderAdd => "STRINGBUILDER_ADD",
    StringBuilderClear => "STRINGBUILDER_CLEAR",
    StringBuilderToString => "STRINGBUILDER_TOSTRING",
    StrongReferenceEquality => "STRONG_REFERENCE_EQUALITY",
    ToCodeString => "TO_CODE_STRING",
    TryParseFloat => "TRY_PARSE_FLOAT",
    Utf8BytesToString => "UTF8_BYTES_TO_STRING",
}

impl CoreFunction {
    /// Number of core functions.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index for table lookups.
    #[inline]
    pub fn index(self) -> usize {
        u16::from(self) as usize
    }
}
