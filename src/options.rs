use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Optimization level requested from a code generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum OptLevel {
    O0 = 0,
    O1,
    O2,
    O3,
}

/// Options consumed by code generators. The recorder itself ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub opt_level: OptLevel,
    pub fast_math: bool,
    pub approx_math_func: bool,
    /// Whether generated code keeps its assertions; on by default only in
    /// debug builds.
    pub enable_assert: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::O3,
            fast_math: false,
            approx_math_func: false,
            enable_assert: cfg!(debug_assertions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opt_level_from_number() {
        assert_eq!(OptLevel::try_from(0u8), Ok(OptLevel::O0));
        assert_eq!(OptLevel::try_from(3u8), Ok(OptLevel::O3));
        assert!(OptLevel::try_from(4u8).is_err());
        assert_eq!(u8::from(OptLevel::O2), 2);
    }

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.opt_level, OptLevel::O3);
        assert!(!options.fast_math);
        assert!(!options.approx_math_func);
    }
}
