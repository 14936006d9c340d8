//! Default values for configuration fields.

pub fn default_depth() -> usize {
    2
}

pub fn default_max_nodes() -> usize {
    100
}

pub fn default_concurrency() -> usize {
    stamp_core::pipeline::DEFAULT_CONCURRENCY
}

pub fn default_cli_dirs() -> Vec<String> {
    ["cli", "bin", "scripts"].map(String::from).to_vec()
}

pub fn default_extensions() -> Vec<String> {
    ["ts", "tsx", "js", "jsx", "mjs", "cjs", "vue"]
        .map(String::from)
        .to_vec()
}
