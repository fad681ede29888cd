mod minijinja;

pub use self::minijinja::MiniJinjaEngine;

use std::path::Path;

use crate::error::Result;
use crate::util::mtime;
use crate::walk::files_with_ext;

/// The newest modification time among the `.html` templates under
/// `templates`, or `0` if there are none.
pub fn templates_mtime(templates: &Path) -> Result<f64> {
    let mut latest = 0.0f64;
    for template in files_with_ext(templates, "html")? {
        latest = latest.max(mtime(&template.path)?);
    }

    Ok(latest)
}
