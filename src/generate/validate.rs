use std::path::Path;

/// Post-generation gate. `source_file` is the file the tests target.
pub trait Validator {
    fn validate(&self, source_file: &Path, content: &str) -> Result<(), String>;
}

/// Accepts everything. The default until a real compile check is wired in.
pub struct PassThrough;

impl Validator for PassThrough {
    fn validate(&self, _source_file: &Path, _content: &str) -> Result<(), String> {
        Ok(())
    }
}
