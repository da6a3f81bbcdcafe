use docindex_common::NumberPadding;

/// Constructor-supplied configuration. The teacher's `storage/sled` takes
/// its equivalents (db path, temp-vs-persistent) as constructor args rather
/// than reading its own config file, so this crate does the same instead of
/// adding a config-file layer.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Default numeric padding scheme applied when a field definition
    /// doesn't override it (spec.md §4.1).
    pub number_padding: NumberPadding,
    /// Pending-op buffer size before an incremental reindex flushes a batch
    /// (spec.md §4.4: "specified: 25").
    pub batch_flush_threshold: usize,
    /// Effective limit used by `query` when neither `first` nor `last` is
    /// given (spec.md §4.5).
    pub default_page_size: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self { Self { number_padding: NumberPadding::default(), batch_flush_threshold: 25, default_page_size: 50 } }
}
