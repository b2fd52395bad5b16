//! The scramble row transform.

use hookchain_core::AppResult;
use hookchain_core::host::ColumnDesc;
use hookchain_plugin_sdk::prelude::ColumnRewriter;

use crate::config::ScrambleSettings;

/// Replaces every byte of a matching column's payload with the configured
/// replacement sequence.
///
/// With the default four-byte sequence a payload of `L` bytes becomes `4 * L`
/// bytes; stacking two instances gives `16 * L`.
#[derive(Debug, Clone)]
pub struct ScrambleRewriter {
    settings: ScrambleSettings,
}

impl ScrambleRewriter {
    /// Creates the transform from validated settings.
    pub fn new(settings: ScrambleSettings) -> Self {
        Self { settings }
    }

    /// The settings in effect.
    pub fn settings(&self) -> &ScrambleSettings {
        &self.settings
    }
}

impl ColumnRewriter for ScrambleRewriter {
    fn applies_to(&self, column: &ColumnDesc) -> bool {
        self.settings.column_types.contains(&column.type_oid)
    }

    fn rewritten_len(&self, payload: &[u8]) -> AppResult<usize> {
        self.settings.scrambled_len(payload.len())
    }

    fn rewrite(&self, _payload: &[u8], out: &mut [u8]) {
        for chunk in out.chunks_mut(self.settings.replacement.len()) {
            chunk.copy_from_slice(&self.settings.replacement[..chunk.len()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use hookchain_core::config::modules::ScrambleConfig;
    use hookchain_core::host::TypeOid;

    use super::*;

    fn rewriter() -> ScrambleRewriter {
        ScrambleRewriter::new(ScrambleSettings::from_config(&ScrambleConfig::default()).expect("valid"))
    }

    #[test]
    fn test_rewrite_repeats_sequence_per_byte() {
        let rewriter = rewriter();
        let payload = b"abc";
        let mut out = vec![0u8; rewriter.rewritten_len(payload).expect("fits")];
        rewriter.rewrite(payload, &mut out);
        assert_eq!(out.len(), 12);
        assert_eq!(std::str::from_utf8(&out).expect("utf-8"), "\u{1F4A9}".repeat(3));
    }

    #[test]
    fn test_applies_only_to_configured_types() {
        let rewriter = rewriter();
        assert!(rewriter.applies_to(&ColumnDesc::new("body", TypeOid::Text)));
        assert!(rewriter.applies_to(&ColumnDesc::new("name", TypeOid::Varchar)));
        assert!(!rewriter.applies_to(&ColumnDesc::new("blob", TypeOid::Bytea)));
        assert!(!rewriter.applies_to(&ColumnDesc::new("id", TypeOid::Int4)));
    }

    #[test]
    fn test_empty_payload_stays_empty() {
        let rewriter = rewriter();
        assert_eq!(rewriter.rewritten_len(b"").expect("fits"), 0);
    }
}
