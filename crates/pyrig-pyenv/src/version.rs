use pyrig_backend::PythonVersion;

/// CPython releases from `pyenv install --list`. Other distributions
/// (pypy, miniconda, ...), pre-releases and free-threaded builds are dropped.
#[must_use]
pub fn parse_install_list(output: &str) -> Vec<PythonVersion> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.parse::<PythonVersion>().ok())
        .filter(|version| version.patch.is_some())
        .collect()
}

/// Highest patch release within `series`.
#[must_use]
pub fn newest_patch<'a>(
    available: &'a [PythonVersion],
    series: &PythonVersion,
) -> Option<&'a PythonVersion> {
    available
        .iter()
        .filter(|version| version.same_series(series))
        .max()
}
