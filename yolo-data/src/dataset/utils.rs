use crate::common::*;

/// Load a newline-separated class names file.
///
/// The line order defines the class ids. Blank lines are ignored.
pub async fn load_classes_file<P>(path: P) -> Result<IndexSet<String>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;

    let mut classes = IndexSet::new();
    for (line_index, line) in content.lines().enumerate() {
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        if !classes.insert(name.to_owned()) {
            return Err(Error::parse(
                path,
                line_index + 1,
                format!("duplicated class name '{}'", name),
            ));
        }
    }

    if classes.is_empty() {
        return Err(Error::Config(format!(
            "no classes found in '{}'",
            path.display()
        )));
    }

    Ok(classes)
}
