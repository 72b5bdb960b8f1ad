//! Target language selection and the feature flags it implies.

use bitflags::bitflags;

/// The language a program is being compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetLanguage {
    #[default]
    CSharp,
    Java,
    JavaScript,
    Php,
    Python,
}

impl TargetLanguage {
    /// Every supported target.
    pub const ALL: [TargetLanguage; 5] = [
        TargetLanguage::CSharp,
        TargetLanguage::Java,
        TargetLanguage::JavaScript,
        TargetLanguage::Php,
        TargetLanguage::Python,
    ];
}

bitflags! {
    /// Capabilities of the target language, queried with `@pastel_flag("NAME")`.
    ///
    /// Flag names are exactly the names accepted by `@pastel_flag`, so
    /// [`LanguageFeatures::from_name`] doubles as the lookup.
    ///
    /// ```rust
    /// use pastel_core::{LanguageFeatures, TargetLanguage};
    ///
    /// let js = LanguageFeatures::for_target(TargetLanguage::JavaScript);
    /// assert!(js.contains(LanguageFeatures::INT_IS_FLOOR));
    /// assert!(!js.contains(LanguageFeatures::STRONGLY_TYPED));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LanguageFeatures: u32 {
        const IS_CSHARP = 1 << 0;
        const IS_JAVA = 1 << 1;
        const IS_JAVASCRIPT = 1 << 2;
        const IS_PHP = 1 << 3;
        const IS_PYTHON = 1 << 4;
        /// Variables carry static types.
        const STRONGLY_TYPED = 1 << 5;
        const STATICALLY_TYPED = 1 << 6;
        const DYNAMICALLY_TYPED = 1 << 7;
        /// Arrays and lists share one runtime representation.
        const ARRAY_IS_LIST = 1 << 8;
        /// `++` and `--` exist natively.
        const HAS_INCREMENT = 1 << 9;
        /// Integer division must be floored explicitly.
        const INT_IS_FLOOR = 1 << 10;
        const IS_CHAR_A_NUMBER = 1 << 11;
        const PLATFORM_SUPPORTS_LIST_CLEAR = 1 << 12;
    }
}

impl LanguageFeatures {
    /// The feature set of a target language.
    pub fn for_target(target: TargetLanguage) -> Self {
        match target {
            TargetLanguage::CSharp => {
                Self::IS_CSHARP
                    | Self::STRONGLY_TYPED
                    | Self::STATICALLY_TYPED
                    | Self::HAS_INCREMENT
                    | Self::IS_CHAR_A_NUMBER
                    | Self::PLATFORM_SUPPORTS_LIST_CLEAR
            }
            TargetLanguage::Java => {
                Self::IS_JAVA
                    | Self::STRONGLY_TYPED
                    | Self::STATICALLY_TYPED
                    | Self::HAS_INCREMENT
                    | Self::IS_CHAR_A_NUMBER
                    | Self::PLATFORM_SUPPORTS_LIST_CLEAR
            }
            TargetLanguage::JavaScript => {
                Self::IS_JAVASCRIPT
                    | Self::DYNAMICALLY_TYPED
                    | Self::ARRAY_IS_LIST
                    | Self::HAS_INCREMENT
                    | Self::INT_IS_FLOOR
            }
            TargetLanguage::Php => {
                Self::IS_PHP
                    | Self::DYNAMICALLY_TYPED
                    | Self::ARRAY_IS_LIST
                    | Self::HAS_INCREMENT
                    | Self::PLATFORM_SUPPORTS_LIST_CLEAR
            }
            TargetLanguage::Python => {
                Self::IS_PYTHON | Self::DYNAMICALLY_TYPED | Self::ARRAY_IS_LIST
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_language_flag_per_target() {
        let language_flags = LanguageFeatures::IS_CSHARP
            | LanguageFeatures::IS_JAVA
            | LanguageFeatures::IS_JAVASCRIPT
            | LanguageFeatures::IS_PHP
            | LanguageFeatures::IS_PYTHON;
        for target in TargetLanguage::ALL {
            let set = LanguageFeatures::for_target(target) & language_flags;
            assert_eq!(set.bits().count_ones(), 1, "{target:?}");
        }
    }

    #[test]
    fn typing_is_static_or_dynamic() {
        for target in TargetLanguage::ALL {
            let f = LanguageFeatures::for_target(target);
            assert_ne!(
                f.contains(LanguageFeatures::STATICALLY_TYPED),
                f.contains(LanguageFeatures::DYNAMICALLY_TYPED)
            );
        }
    }

    #[test]
    fn python_has_no_increment() {
        let py = LanguageFeatures::for_target(TargetLanguage::Python);
        assert!(!py.contains(LanguageFeatures::HAS_INCREMENT));
        assert!(!py.contains(LanguageFeatures::PLATFORM_SUPPORTS_LIST_CLEAR));
    }

    #[test]
    fn flags_are_found_by_name() {
        assert_eq!(
            LanguageFeatures::from_name("ARRAY_IS_LIST"),
            Some(LanguageFeatures::ARRAY_IS_LIST)
        );
        assert_eq!(LanguageFeatures::from_name("IS_COBOL"), None);
    }
}
