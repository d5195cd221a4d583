use std::sync::LazyLock;

/// Release version, suffixed with the git commit when it is known.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    format_version(
        env!("RELEASE_VERSION"),
        option_env!("VERGEN_GIT_SHA"),
        option_env!("VERGEN_GIT_DIRTY") == Some("true"),
    )
});

fn format_version(release: &str, sha: Option<&str>, dirty: bool) -> String {
    format!(
        "{}-{}{}",
        release,
        sha.unwrap_or("unknown"),
        if dirty { "-dirty" } else { "" }
    )
}
