//! Resolved settings for the scramble transform.

use hookchain_core::config::modules::ScrambleConfig;
use hookchain_core::host::TypeOid;
use hookchain_core::{AppError, AppResult};

use crate::error::ScrambleError;

/// Validated form of [`ScrambleConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrambleSettings {
    /// Bytes written once per byte of the original payload.
    pub replacement: Vec<u8>,
    /// Column types the transform applies to.
    pub column_types: Vec<TypeOid>,
}

impl ScrambleSettings {
    /// Validates `config`.
    pub fn from_config(config: &ScrambleConfig) -> Result<Self, ScrambleError> {
        if config.replacement.is_empty() {
            return Err(ScrambleError::EmptyReplacement);
        }
        if config.column_types.is_empty() {
            return Err(ScrambleError::NoColumnTypes);
        }

        let column_types = config
            .column_types
            .iter()
            .map(|name| {
                let oid: TypeOid = name
                    .parse()
                    .map_err(|_| ScrambleError::UnknownColumnType { name: name.clone() })?;
                if !oid.is_varlena() {
                    return Err(ScrambleError::FixedWidthColumnType { name: name.clone() });
                }
                Ok(oid)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            replacement: config.replacement.as_bytes().to_vec(),
            column_types,
        })
    }

    /// Payload length of the replacement for a `payload_len`-byte value.
    pub fn scrambled_len(&self, payload_len: usize) -> AppResult<usize> {
        payload_len
            .checked_mul(self.replacement.len())
            .ok_or_else(|| {
                AppError::allocation(format!(
                    "Scrambling {payload_len} bytes overflows the value size"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ScrambleSettings::from_config(&ScrambleConfig::default()).expect("valid");
        assert_eq!(settings.replacement.len(), 4);
        assert_eq!(settings.column_types, vec![TypeOid::Text, TypeOid::Varchar]);
        assert_eq!(settings.scrambled_len(3).expect("fits"), 12);
    }

    #[test]
    fn test_scrambled_len_overflow_is_an_allocation_error() {
        let settings = ScrambleSettings::from_config(&ScrambleConfig::default()).expect("valid");
        let err = settings.scrambled_len(usize::MAX / 2).expect_err("overflow");
        assert_eq!(err.kind, hookchain_core::error::ErrorKind::Allocation);
    }

    #[test]
    fn test_rejects_empty_replacement() {
        let config = ScrambleConfig {
            replacement: String::new(),
            ..ScrambleConfig::default()
        };
        assert!(matches!(
            ScrambleSettings::from_config(&config),
            Err(ScrambleError::EmptyReplacement)
        ));
    }

    #[test]
    fn test_rejects_fixed_width_and_unknown_types() {
        let config = ScrambleConfig {
            column_types: vec!["int4".into()],
            ..ScrambleConfig::default()
        };
        assert!(matches!(
            ScrambleSettings::from_config(&config),
            Err(ScrambleError::FixedWidthColumnType { .. })
        ));

        let config = ScrambleConfig {
            column_types: vec!["geometry".into()],
            ..ScrambleConfig::default()
        };
        assert!(matches!(
            ScrambleSettings::from_config(&config),
            Err(ScrambleError::UnknownColumnType { .. })
        ));
    }
}
