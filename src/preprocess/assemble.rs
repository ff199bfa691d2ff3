use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::closure::Closure;
use crate::assets::storage::ShaderCache;
use crate::key::ModuleKey;
use crate::options::LoaderOptions;

/// Output of one assembly pass.
#[derive(Debug, Default)]
pub struct Assembly {
    /// Module → assembled text.
    pub code: FxHashMap<ModuleKey, Arc<str>>,
    /// Included modules absent from the sources, de-duplicated and sorted.
    pub missing: Vec<ModuleKey>,
}

/// Removes every include directive line.
#[must_use]
pub fn strip_includes(code: &str, options: &LoaderOptions) -> String {
    code.lines()
        .filter(|line| !options.is_include(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inlines each module's ranked closure ahead of its own text and records
/// the result in the processed cache.
pub fn assemble(
    sources: &FxHashMap<ModuleKey, Arc<str>>,
    closures: &FxHashMap<ModuleKey, Closure>,
    cache: &ShaderCache,
    options: &LoaderOptions,
) -> Assembly {
    let mut assembly = Assembly::default();

    for (name, own) in sources {
        let mut pieces: Vec<&str> = Vec::new();

        if let Some(closure) = closures.get(name) {
            for include in &closure.order {
                match sources.get(include) {
                    Some(text) => pieces.push(text),
                    None => {
                        if !assembly.missing.contains(include) {
                            assembly.missing.push(include.clone());
                        }
                    }
                }
            }
        }
        pieces.push(own);

        let processed = cache
            .processed
            .insert(name.clone(), strip_includes(&pieces.join("\n"), options));
        assembly.code.insert(name.clone(), processed);
    }

    assembly.missing.sort();
    assembly
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_includes() {
        let options = LoaderOptions::default();
        let code = "#include <common>\nfloat a;\n  #include <noise>  \nfloat b;";
        assert_eq!(strip_includes(code, &options), "float a;\nfloat b;");
    }

    #[test]
    fn test_strip_keeps_commented_directive() {
        let options = LoaderOptions::default();
        assert_eq!(strip_includes("// #include <x>", &options), "// #include <x>");
    }
}
