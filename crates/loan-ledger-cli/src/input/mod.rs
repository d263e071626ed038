pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Take typed input from `--input <file>`, then piped stdin, then flags.
pub fn resolve<T: DeserializeOwned>(
    path: Option<&str>,
    from_flags: impl FnOnce() -> CliResult<T>,
) -> CliResult<T> {
    if let Some(path) = path {
        return file::read_json(path);
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(value),
        None => from_flags(),
    }
}
