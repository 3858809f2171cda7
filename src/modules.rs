//! Namespaces and the module loader.
//!
//! A namespace is a named, independently loaded set of rules plus its own
//! imports. The loader resolves the import graph reachable from `Main`
//! into a [`NamespaceMap`]: `Prelude` is always loaded first from its
//! fixed internal source, `Main` is registered synthetically from the
//! caller's rules and imports, and every transitively imported module is
//! resolved by name exactly once (depth-first, memoized). Modules are
//! looked up in the bundled table first, then as `<dir>/<Name>.rx` in the
//! configured user directory; found in both is an error, found in
//! neither is an error.
//!
//! The namespace map is persistent (`im::HashMap`): callers mutate by
//! building a new map and swapping it in whole, which is what makes
//! rollback-on-error a no-op.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::ast::{Import, Rule, Term, TopLevelItem};
use crate::errors::{RedexError, Result};
use crate::syntax::parse_source;

/// The always-loaded, globally visible base namespace.
pub const PRELUDE: &str = "Prelude";

/// The synthetic namespace holding the caller's own rules and imports.
pub const MAIN: &str = "Main";

/// Fixed internal source of the Prelude.
///
/// The identity rules for `Cons` and `Nil` make constructor calls their
/// own normal form: the engine fires the rule, the evaluator sees an
/// unchanged term and stops, and unsaturated data never reads as a
/// missing rule.
pub const PRELUDE_SRC: &str = r#"
// Prelude — loaded before everything else, visible everywhere.

// A non-final wildcard would end positional matching early and leave
// the remaining parameters unbound, so both branches name every slot.
def if(true, then, else) = then
def if(false, then, else) = else

def not(true) = false
def not(false) = true
def and(true, b) = b
def and(false, _) = false
def or(true, _) = true
def or(false, b) = b

def min(a, b) = if(a <= b, a, b)
def max(a, b) = if(a >= b, a, b)

// List constructors are their own normal form.
def Cons(x, rest) = Cons(x, rest)
def Nil() = Nil()
"#;

const LISTS_SRC: &str = r#"
// Bundled list operations over Cons/Nil.
import Prelude

def head(Cons(x, rest)) = x
def tail(Cons(x, rest)) = rest
def isEmpty(Nil()) = true
def isEmpty(Cons(x, rest)) = false
def length(Nil()) = 0
def length(Cons(x, rest)) = 1 + length(rest)
def append(Nil(), ys) = ys
def append(Cons(x, rest), ys) = Cons(x, append(rest, ys))
"#;

/// Modules shipped with the interpreter, resolved before the user
/// directory.
static BUNDLED_MODULES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut modules = HashMap::new();
    modules.insert("Lists", LISTS_SRC);
    modules
});

/// A named set of rules, its imports, and any embedded unit tests.
/// Definition order of rules is match priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub rules: Vec<Rule>,
    pub imports: Vec<Import>,
    pub unit_tests: Vec<Term>,
}

impl Namespace {
    pub fn new(name: impl Into<String>, rules: Vec<Rule>, imports: Vec<Import>) -> Namespace {
        Namespace {
            name: name.into(),
            rules,
            imports,
            unit_tests: Vec::new(),
        }
    }

    /// Whether `module` is among this namespace's declared imports.
    pub fn imports_module(&self, module: &str) -> bool {
        self.imports.iter().any(|imp| imp.module == module)
    }
}

/// The authoritative, swapped-whole map of loaded namespaces.
pub type NamespaceMap = im::HashMap<String, Namespace>;

/// Resolves module names to namespaces, memoizing by name.
pub struct ModuleLoader {
    user_modules_dir: PathBuf,
    collect_tests: bool,
}

/// Tri-state load progress. A module absent from both sets is unloaded;
/// re-entering one that is still in progress is a true import cycle.
struct LoadState {
    loaded: NamespaceMap,
    in_progress: HashSet<String>,
}

impl ModuleLoader {
    /// `collect_tests` controls what a bare expression in a module file
    /// means: a unit test of that namespace, or invalid content.
    pub fn new(user_modules_dir: impl Into<PathBuf>, collect_tests: bool) -> ModuleLoader {
        ModuleLoader {
            user_modules_dir: user_modules_dir.into(),
            collect_tests,
        }
    }

    /// Loads Prelude, registers `Main` from the caller's rules and
    /// imports, and resolves every transitively reachable import.
    pub fn load_all(
        &self,
        main_rules: Vec<Rule>,
        main_imports: Vec<Import>,
    ) -> Result<NamespaceMap> {
        let mut state = LoadState {
            loaded: NamespaceMap::new(),
            in_progress: HashSet::new(),
        };

        self.load_module(&mut state, PRELUDE)?;

        let main = Namespace::new(MAIN, main_rules, main_imports);
        let imports = main.imports.clone();
        state.loaded.insert(MAIN.to_string(), main);

        for import in &imports {
            self.load_module(&mut state, &import.module)?;
        }

        Ok(state.loaded)
    }

    fn load_module(&self, state: &mut LoadState, module: &str) -> Result<()> {
        if state.loaded.contains_key(module) {
            return Ok(());
        }
        if !state.in_progress.insert(module.to_string()) {
            return Err(RedexError::ImportCycle {
                module: module.to_string(),
            });
        }

        let source = self.read_module_source(module)?;
        let namespace = self.parse_module(state, module, &source)?;

        state.in_progress.remove(module);
        state.loaded.insert(module.to_string(), namespace);
        Ok(())
    }

    /// Parses one module's items, loading its own imports depth-first
    /// before the module is committed.
    fn parse_module(
        &self,
        state: &mut LoadState,
        module: &str,
        source: &str,
    ) -> Result<Namespace> {
        let items = parse_source(source)?;

        let mut rules = Vec::new();
        let mut imports = Vec::new();
        let mut unit_tests = Vec::new();
        for item in items {
            match item {
                TopLevelItem::Rule(rule) => rules.push(rule),
                TopLevelItem::Import(import) => {
                    self.load_module(state, &import.module)?;
                    imports.push(import);
                }
                TopLevelItem::Expr(expr) if self.collect_tests => unit_tests.push(expr),
                TopLevelItem::Expr(_) => {
                    return Err(RedexError::InvalidModuleContent {
                        module: module.to_string(),
                    })
                }
            }
        }

        Ok(Namespace {
            name: module.to_string(),
            rules,
            imports,
            unit_tests,
        })
    }

    /// Source resolution: Prelude is always internal; other modules come
    /// from the bundled table or the user directory, and being present
    /// in both is a hard error.
    fn read_module_source(&self, module: &str) -> Result<String> {
        if module == PRELUDE {
            return Ok(PRELUDE_SRC.to_string());
        }

        let bundled = BUNDLED_MODULES.get(module);
        let user_path = self.user_modules_dir.join(format!("{module}.rx"));
        let user_exists = user_path.is_file();

        match (bundled, user_exists) {
            (Some(_), true) => Err(RedexError::DuplicateModule {
                module: module.to_string(),
            }),
            (Some(source), false) => Ok((*source).to_string()),
            (None, true) => Ok(fs::read_to_string(&user_path)?),
            (None, false) => Err(RedexError::ModuleNotFound {
                module: module.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader_without_user_dir() -> ModuleLoader {
        ModuleLoader::new("/nonexistent/redex-modules", false)
    }

    #[test]
    fn prelude_and_main_are_always_present() {
        let map = loader_without_user_dir()
            .load_all(Vec::new(), Vec::new())
            .unwrap();
        assert!(map.contains_key(PRELUDE));
        assert!(map.contains_key(MAIN));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn prelude_carries_conditional_and_constructor_rules() {
        let map = loader_without_user_dir()
            .load_all(Vec::new(), Vec::new())
            .unwrap();
        let prelude = &map[PRELUDE];
        let names: Vec<&str> = prelude.rules.iter().map(|r| r.pattern.name.as_str()).collect();
        assert!(names.contains(&"if"));
        assert!(names.contains(&"Cons"));
        assert!(names.contains(&"Nil"));
    }

    #[test]
    fn bundled_module_resolves_with_its_imports() {
        let map = loader_without_user_dir()
            .load_all(Vec::new(), vec![Import { module: "Lists".into() }])
            .unwrap();
        let lists = &map["Lists"];
        assert!(lists.imports_module(PRELUDE));
        assert!(lists.rules.iter().any(|r| r.pattern.name == "append"));
    }

    #[test]
    fn missing_module_fails_the_whole_load() {
        let err = loader_without_user_dir()
            .load_all(Vec::new(), vec![Import { module: "DoesNotExist".into() }])
            .unwrap_err();
        assert!(matches!(err, RedexError::ModuleNotFound { module } if module == "DoesNotExist"));
    }

    #[test]
    fn repeated_load_is_idempotent() {
        let loader = loader_without_user_dir();
        let imports = vec![Import { module: "Lists".into() }];
        let first = loader.load_all(Vec::new(), imports.clone()).unwrap();
        let second = loader.load_all(Vec::new(), imports).unwrap();
        for (name, namespace) in &first {
            assert_eq!(namespace.rules.len(), second[name].rules.len());
        }
    }
}
