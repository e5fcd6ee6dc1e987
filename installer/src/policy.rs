//! Naming conventions applied before talking to the storage server or APT.

use log::warn;

/// Codenames without native OpenVINO APT packages and their replacement.
const APT_CODENAME_SUBSTITUTES: &[(&str, &str)] = &[("jammy", "focal")];

/// Strip one trailing `.0` from a version; the manifest omits it.
///
/// # Examples
///
/// ```
/// use openvino_installer::policy::normalize_version;
///
/// assert_eq!(normalize_version("2022.3.0"), "2022.3");
/// assert_eq!(normalize_version("2022.3.1"), "2022.3.1");
/// assert_eq!(normalize_version("2022.0.0"), "2022.0");
/// ```
#[must_use]
pub fn normalize_version(version: &str) -> &str {
    version.strip_suffix(".0").unwrap_or(version)
}

/// The release year of a version: everything before the first `.`.
#[must_use]
pub fn version_year(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

/// Map `codename` to a compatible codename that has APT packages.
///
/// Returns `None` when no substitution applies. A warning is logged when one
/// does.
#[must_use]
pub fn substitute_apt_codename(codename: &str) -> Option<&'static str> {
    let (_, substitute) = APT_CODENAME_SUBSTITUTES
        .iter()
        .find(|(from, _)| *from == codename)?;
    warn!("downgrading {codename} packages to {substitute}; OpenVINO has no {codename} packages but {substitute} should work");
    Some(substitute)
}
