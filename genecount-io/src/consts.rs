/// First line of a preprocessed feature cache.
pub const CACHE_HEADER: &str = "#preprocessed";
pub const DEFAULT_FEATURE_TYPE: &str = "exon";
pub const DEFAULT_FEATURE_ID: &str = "gene_id";
pub const GTF_COLUMNS: usize = 9;
pub const CACHE_COLUMNS: usize = 4;
