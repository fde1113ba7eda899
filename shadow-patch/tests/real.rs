//! Patching private state of a type owned by another module.

use facet::Facet;
use shadow_patch::patch;

mod harness {
    use facet::Facet;

    /// Which tests a runner selects.
    #[derive(Debug, Clone, PartialEq, Facet)]
    #[repr(u8)]
    pub enum Filter {
        All,
        Prefix(String),
        Exact(String),
    }

    impl Filter {
        fn accepts(&self, test: &str) -> bool {
            match self {
                Filter::All => true,
                Filter::Prefix(prefix) => test.starts_with(prefix.as_str()),
                Filter::Exact(name) => test == name,
            }
        }
    }

    #[derive(Default, Facet)]
    struct Context {
        filter: Option<Box<Filter>>,
        max_parallel: u32,
    }

    /// A test runner whose configuration is only reachable through its
    /// private fields.
    #[derive(Facet)]
    pub struct Runner {
        name: String,
        context: Option<Box<Context>>,
        verbose: bool,
    }

    impl Runner {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                context: None,
                verbose: false,
            }
        }

        pub fn name(&self) -> &str {
            &self.name
        }

        pub fn selects(&self, test: &str) -> bool {
            match self.context.as_ref().and_then(|ctx| ctx.filter.as_ref()) {
                Some(filter) => filter.accepts(test),
                None => true,
            }
        }

        pub fn max_parallel(&self) -> u32 {
            self.context.as_ref().map_or(1, |ctx| ctx.max_parallel.max(1))
        }

        pub fn is_verbose(&self) -> bool {
            self.verbose
        }
    }
}

use harness::{Filter, Runner};

#[derive(Facet)]
struct FilterContext {
    filter: Option<Box<Filter>>,
}

#[derive(Facet)]
struct WithFilter {
    context: Option<Box<FilterContext>>,
}

#[derive(Facet)]
struct ParallelContext {
    max_parallel: u32,
}

#[derive(Facet)]
struct WithParallel {
    context: Option<Box<ParallelContext>>,
}

#[derive(Facet)]
struct Rename {
    name: String,
    verbose: bool,
}

#[test]
fn private_fields_are_patched() {
    let mut runner = Runner::new("unit");
    patch(
        &mut runner,
        &Rename {
            name: "integration".into(),
            verbose: true,
        },
    )
    .unwrap();
    assert_eq!(runner.name(), "integration");
    assert!(runner.is_verbose());
}

#[test]
fn absent_private_context_is_allocated_and_patched() {
    let mut runner = Runner::new("unit");
    assert!(runner.selects("fs::read"));

    patch(
        &mut runner,
        &WithFilter {
            context: Some(Box::new(FilterContext {
                filter: Some(Box::new(Filter::Prefix("net::".into()))),
            })),
        },
    )
    .unwrap();

    assert!(runner.selects("net::connect"));
    assert!(!runner.selects("fs::read"));
    assert_eq!(runner.max_parallel(), 1);
}

#[test]
fn second_patch_keeps_first() {
    let mut runner = Runner::new("unit");

    patch(
        &mut runner,
        &WithFilter {
            context: Some(Box::new(FilterContext {
                filter: Some(Box::new(Filter::Exact("net::connect".into()))),
            })),
        },
    )
    .unwrap();
    patch(
        &mut runner,
        &WithParallel {
            context: Some(Box::new(ParallelContext { max_parallel: 4 })),
        },
    )
    .unwrap();

    assert_eq!(runner.max_parallel(), 4);
    assert!(runner.selects("net::connect"));
    assert!(!runner.selects("net::listen"));
}

#[test]
fn patched_filter_is_a_snapshot() {
    let mut runner = Runner::new("unit");
    let mut shadow = WithFilter {
        context: Some(Box::new(FilterContext {
            filter: Some(Box::new(Filter::Prefix("net::".into()))),
        })),
    };
    patch(&mut runner, &shadow).unwrap();

    if let Some(ctx) = shadow.context.as_mut() {
        ctx.filter = Some(Box::new(Filter::All));
    }
    assert!(!runner.selects("fs::read"));
}
