use std::{error::Error, path::Path};

use log::{debug, info};

use crate::{
    graph::{self, Diagnostics},
    index::{PackageIndex, SourceGroups},
    model::package::PackageRef,
    resolver::SourceResolver,
};

/// Handler to closure command
pub fn do_closure<I: PackageIndex>(
    sources: &SourceResolver<'_, I>,
    package: &str,
    max_depth: usize,
) -> Result<(), Box<dyn Error>> {
    debug!("Expanding closure of {package} to depth {max_depth}");

    let mut diagnostics = Diagnostics::new();
    let closure = graph::closure(sources, &PackageRef::from(package), max_depth, &mut diagnostics)?;
    for package in &closure {
        println!("{package}");
    }

    report(&diagnostics);
    Ok(())
}

/// Handler to requires command
pub fn do_requires<I: PackageIndex>(
    sources: &SourceResolver<'_, I>,
    package: &str,
    build: bool,
) -> Result<(), Box<dyn Error>> {
    let mut diagnostics = Diagnostics::new();
    let reference = PackageRef::from(package);
    let requires = if build {
        graph::build_requires_of(sources, &reference, &mut diagnostics)?
    } else {
        graph::requires_of(sources.resolver(), &reference, &mut diagnostics)?
    };
    for package in &requires {
        println!("{package}");
    }

    report(&diagnostics);
    Ok(())
}

/// Handler to subpackages command
pub fn do_subpackages<I: PackageIndex>(
    sources: &SourceResolver<'_, I>,
    package: &str,
) -> Result<(), Box<dyn Error>> {
    let subpackages = sources.subpackages_of(&PackageRef::from(package))?;
    for package in &subpackages {
        println!("{package}");
    }
    Ok(())
}

/// Handler to graph command
/// Builds requirement edges for every binary package of the index and
/// emits the JSON projection to stdout or a file.
pub fn do_graph<I: PackageIndex>(
    sources: &SourceResolver<'_, I>,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let mut diagnostics = Diagnostics::new();
    let dependency_graph = graph::build_graph(sources, &mut diagnostics)?;

    let json = serde_json::to_string_pretty(&dependency_graph.to_json())?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("Wrote dependency graph to {}", path.display());
        }
        None => println!("{json}"),
    }

    report(&diagnostics);
    Ok(())
}

/// Handler to stats command
pub fn do_stats(groups: &SourceGroups) -> Result<(), Box<dyn Error>> {
    println!("{} {}", groups.source_count(), groups.package_count());
    Ok(())
}

fn report(diagnostics: &Diagnostics) {
    if !diagnostics.is_empty() {
        info!(
            "{} requirements could not be resolved and were skipped",
            diagnostics.len()
        );
    }
}
