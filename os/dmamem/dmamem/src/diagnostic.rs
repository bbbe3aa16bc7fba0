/// The fixed text served by `read`.
pub const MESSAGE: &[u8] = b"dmamem platform char device read!\n";

/// Fixed-text read-back with caller-held cursor.
pub struct DiagnosticChannel;

impl DiagnosticChannel {
    /// The bytes of the message starting at `offset`, at most `max_len`.
    /// Empty once `offset` reaches the end.
    #[must_use]
    pub fn read(offset: u64, max_len: usize) -> &'static [u8] {
        let Ok(start) = usize::try_from(offset) else {
            return &[];
        };
        let Some(rest) = MESSAGE.get(start..) else {
            return &[];
        };
        &rest[..rest.len().min(max_len)]
    }
}
