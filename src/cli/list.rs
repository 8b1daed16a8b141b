//! `kvendor list`: show the resolved, ordered package set of a scope.
//!
//! Without arguments the shared scope is shown; with a group and cluster the
//! cluster scope. A group alone lists every cluster of that group.

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;

use super::CommandContext;
use crate::config::{ConfigSpec, Package, PackageKind};
use crate::ordering::{ordered_packages, resource_path};
use crate::resolver::ResolvedScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct ListCommand {
    /// Group to list (all clusters of it unless a cluster is given)
    group: Option<String>,

    /// Cluster to list
    cluster: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
pub struct ListedPackage {
    pub kind: PackageKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    pub path: String,
}

impl From<&Package> for ListedPackage {
    fn from(package: &Package) -> Self {
        Self {
            kind: package.id.kind,
            name: package.id.name.clone(),
            flavor: package.id.flavor.clone(),
            version: package.version.clone(),
            weight: (package.id.kind == PackageKind::Module).then_some(package.weight),
            path: resource_path(package),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListedScope {
    /// `all-groups` or `<group>/<cluster>`.
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub packages: Vec<ListedPackage>,
}

impl ListedScope {
    fn new(scope: String, context: Option<String>, resolved: &ResolvedScope) -> Self {
        Self {
            scope,
            context,
            packages: ordered_packages(&resolved.modules, &resolved.addons)
                .into_iter()
                .map(ListedPackage::from)
                .collect(),
        }
    }
}

/// Resolves the scopes selected by `group`/`cluster`.
pub fn select_scopes(
    config: &ConfigSpec,
    group: Option<&str>,
    cluster: Option<&str>,
) -> Result<Vec<ListedScope>> {
    let scopes = match (group, cluster) {
        (None, _) => vec![ListedScope::new(
            crate::constants::SHARED_SCOPE_DIR.to_string(),
            None,
            &ResolvedScope::shared(config),
        )],
        (Some(group), Some(cluster)) => {
            let found = config.cluster(group, cluster)?;
            vec![ListedScope::new(
                format!("{group}/{cluster}"),
                Some(found.context.clone()),
                &ResolvedScope::cluster(config, found),
            )]
        }
        (Some(group), None) => config
            .group(group)?
            .clusters
            .iter()
            .map(|c| {
                ListedScope::new(
                    format!("{group}/{}", c.name),
                    Some(c.context.clone()),
                    &ResolvedScope::cluster(config, c),
                )
            })
            .collect(),
    };
    Ok(scopes)
}

impl ListCommand {
    pub async fn execute(self, ctx: CommandContext) -> Result<()> {
        let config = ctx.load_config()?;
        let scopes = select_scopes(&config, self.group.as_deref(), self.cluster.as_deref())?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scopes)?),
            OutputFormat::Text => {
                for scope in &scopes {
                    print_scope(scope);
                }
            }
        }
        Ok(())
    }
}

fn print_scope(scope: &ListedScope) {
    match &scope.context {
        Some(context) => println!("{} ({})", scope.scope.bold(), context.dimmed()),
        None => println!("{}", scope.scope.bold()),
    }
    if scope.packages.is_empty() {
        println!("  (no packages)");
    }
    for package in &scope.packages {
        let label = match &package.flavor {
            Some(flavor) => format!("{}/{flavor}", package.name),
            None => package.name.clone(),
        };
        let weight = package.weight.map(|w| format!("w={w}")).unwrap_or_default();
        println!(
            "  {:<6} {:<30} {:<12} {:<6} {}",
            package.kind.as_str(),
            label,
            package.version.cyan(),
            weight,
            package.path.dimmed()
        );
    }
}
