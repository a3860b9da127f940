//! Build command derivation from marker files.

use std::path::Path;

use crate::config::GraftConfig;

/// Build tool family recognised from files in the library directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryFlavor {
    NgPackagr,
    Vite,
    Tsc,
    NpmScript,
}

const VITE_CONFIGS: [&str; 3] = ["vite.config.ts", "vite.config.js", "vite.config.mjs"];

impl LibraryFlavor {
    pub fn detect(location: &Path) -> Self {
        if location.join("ng-package.json").is_file() {
            LibraryFlavor::NgPackagr
        } else if VITE_CONFIGS.iter().any(|f| location.join(f).is_file()) {
            LibraryFlavor::Vite
        } else if location.join("tsconfig.json").is_file() {
            LibraryFlavor::Tsc
        } else {
            LibraryFlavor::NpmScript
        }
    }
}

/// How to build one library and how to recognise a finished watch rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    /// Program followed by its arguments.
    pub build: Vec<String>,
    pub watch: Vec<String>,
    /// Substring of a stdout line that signals a completed (re)build.
    pub success_marker: String,
    /// Build output, relative to the library.
    pub output_dir: String,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

impl BuildCommand {
    pub fn for_flavor(flavor: LibraryFlavor, output_dir: &str) -> Self {
        let (build, watch, marker) = match flavor {
            LibraryFlavor::NgPackagr => (
                argv(&["npx", "ng-packagr", "-p", "ng-package.json"]),
                argv(&["npx", "ng-packagr", "-p", "ng-package.json", "--watch"]),
                "Compilation complete",
            ),
            LibraryFlavor::Vite => (
                argv(&["npx", "vite", "build"]),
                argv(&["npx", "vite", "build", "--watch"]),
                "built in",
            ),
            LibraryFlavor::Tsc => (
                argv(&["npx", "tsc", "-p", "tsconfig.json"]),
                argv(&["npx", "tsc", "-p", "tsconfig.json", "--watch"]),
                "Watching for file changes",
            ),
            LibraryFlavor::NpmScript => (
                argv(&["npm", "run", "build"]),
                argv(&["npm", "run", "build", "--", "--watch"]),
                "compiled successfully",
            ),
        };
        Self {
            build,
            watch,
            success_marker: marker.to_string(),
            output_dir: output_dir.to_string(),
        }
    }

    /// Command for the library at `location` with its `[build]` overrides applied.
    pub fn derive(location: &Path, settings: &GraftConfig) -> Self {
        let mut command = Self::for_flavor(LibraryFlavor::detect(location), settings.output_dir());
        if let Some(build) = &settings.build.command {
            command.build = build.clone();
        }
        if let Some(watch) = &settings.build.watch_command {
            command.watch = watch.clone();
        }
        if let Some(marker) = &settings.build.success_marker {
            command.success_marker = marker.clone();
        }
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn flavor_follows_marker_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        assert_eq!(LibraryFlavor::detect(dir), LibraryFlavor::NpmScript);

        std::fs::write(dir.join("tsconfig.json"), "{}").unwrap();
        assert_eq!(LibraryFlavor::detect(dir), LibraryFlavor::Tsc);

        std::fs::write(dir.join("vite.config.mjs"), "").unwrap();
        assert_eq!(LibraryFlavor::detect(dir), LibraryFlavor::Vite);

        std::fs::write(dir.join("ng-package.json"), "{}").unwrap();
        assert_eq!(LibraryFlavor::detect(dir), LibraryFlavor::NgPackagr);
    }

    #[test]
    fn markers_per_flavor() {
        assert_eq!(
            BuildCommand::for_flavor(LibraryFlavor::NgPackagr, "dist").success_marker,
            "Compilation complete"
        );
        assert_eq!(
            BuildCommand::for_flavor(LibraryFlavor::NpmScript, "dist").build,
            vec!["npm", "run", "build"]
        );
    }

    #[test]
    fn overrides_replace_derived_values() {
        let temp = TempDir::new().unwrap();
        let mut settings = GraftConfig::default();
        settings.build.command = Some(vec!["make".to_string()]);
        settings.build.success_marker = Some("done".to_string());
        settings.build.output_dir = Some("lib".to_string());

        let command = BuildCommand::derive(temp.path(), &settings);
        assert_eq!(command.build, vec!["make"]);
        assert_eq!(command.watch, vec!["npm", "run", "build", "--", "--watch"]);
        assert_eq!(command.success_marker, "done");
        assert_eq!(command.output_dir, "lib");
    }
}
