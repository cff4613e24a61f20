//! Platform libraries that are never bundled.

/// System libraries expected on every Linux host.
const LINUX_SYSTEM_LIBS: &[&str] = &[
    "libc.so",
    "libdl.so",
    "libdrm.so",
    "libm.so",
    "libpthread.so",
    "libresolv.so",
    "libselinux.so",
    "libudev.so",
    "libGL.so",
    "libGLX.so",
    "libGLdispatch.so",
    "libX11.so",
    "libXau.so",
    "libXdmcp.so",
    "libXext.so",
    "libXfixes.so",
    "libXrender.so",
];

/// Windows system directories as seen through MSYS paths.
const WINDOWS_SYSTEM_DIRS: &[&str] = &["/c/windows/system", "/c/windows/winsxs/"];

/// Target platform of the binary being bundled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    Linux,
    Windows,
}

impl Platform {
    #[must_use]
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }
}

/// Substring patterns matched against the raw location a lister reports.
///
/// Path fragments are compared case-insensitively (Windows paths come back
/// in any case); library names are compared as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipSet {
    path_fragments: Vec<String>,
    library_names: Vec<String>,
}

impl SkipSet {
    /// A set that skips nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn linux() -> Self {
        Self::empty()
            .with_path_fragments(WINDOWS_SYSTEM_DIRS)
            .with_library_names(LINUX_SYSTEM_LIBS)
    }

    #[must_use]
    pub fn windows() -> Self {
        Self::empty().with_path_fragments(WINDOWS_SYSTEM_DIRS)
    }

    #[must_use]
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Linux => Self::linux(),
            Platform::Windows => Self::windows(),
        }
    }

    #[must_use]
    pub fn for_host() -> Self {
        Self::for_platform(Platform::host())
    }

    #[must_use]
    pub fn with_path_fragments<S: AsRef<str>>(mut self, fragments: &[S]) -> Self {
        self.path_fragments
            .extend(fragments.iter().map(|f| f.as_ref().to_lowercase()));
        self
    }

    #[must_use]
    pub fn with_library_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.library_names
            .extend(names.iter().map(|n| n.as_ref().to_string()));
        self
    }

    /// Whether a dependency reported at `raw_location` should be left out.
    #[must_use]
    pub fn matches(&self, raw_location: &str) -> bool {
        let lowered = raw_location.to_lowercase();
        self.path_fragments.iter().any(|f| lowered.contains(f.as_str()))
            || self
                .library_names
                .iter()
                .any(|name| raw_location.contains(name.as_str()))
    }
}
