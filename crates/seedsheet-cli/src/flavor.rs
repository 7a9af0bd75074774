use std::path::PathBuf;

/// A `name=path` pair given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorArg {
    pub name: String,
    pub path: PathBuf,
}

/// Parse `name=path`, splitting on the first `=`. Both sides are trimmed and
/// must be non-empty.
pub fn parse_flavor(value: &str) -> Result<FlavorArg, String> {
    let (name, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected name=path, got '{value}'"))?;
    let name = name.trim();
    let path = path.trim();

    if name.is_empty() {
        return Err(format!("flavor name is empty in '{value}'"));
    }
    if path.is_empty() {
        return Err(format!("flavor path is empty in '{value}'"));
    }

    Ok(FlavorArg {
        name: name.to_string(),
        path: PathBuf::from(path),
    })
}
