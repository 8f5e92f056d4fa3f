// src/sources/mod.rs
//! Source adapters and the build-time catalog the registry discovers them from.

pub mod html;
pub mod providers;
pub mod types;

use std::sync::Arc;

use anyhow::Result;

use crate::registry::AdapterSpec;
use html::{HtmlSource, PageParser};
use providers::{adb::Adb, bdjobs::BdJobs, bppa::Bppa, care::Care, pksf::Pksf, undp::Undp, ungm::Ungm, worldbank::WorldBank};
use types::{SourceAdapter, SourceContext};

fn html_adapter<P: PageParser>(parser: P, ctx: &SourceContext) -> Result<Arc<dyn SourceAdapter>> {
    Ok(Arc::new(HtmlSource::new(parser, ctx)?))
}

/// Every adapter shipped with the service. Adding a site means adding one
/// line here and one module under `providers/`.
pub fn builtin_catalog() -> Vec<AdapterSpec> {
    vec![
        AdapterSpec::new("adb", Some("ADB"), |ctx| html_adapter(Adb, ctx)),
        AdapterSpec::new("bdjobs", Some("BDJobs"), |ctx| html_adapter(BdJobs, ctx)),
        AdapterSpec::new("bppa", Some("BPPA"), |ctx| html_adapter(Bppa, ctx)),
        AdapterSpec::new("care", Some("CARE Bangladesh"), |ctx| html_adapter(Care, ctx)),
        AdapterSpec::new("pksf", Some("PKSF"), |ctx| html_adapter(Pksf, ctx)),
        AdapterSpec::new("undp", Some("UNDP"), |ctx| html_adapter(Undp, ctx)),
        AdapterSpec::new("ungm", Some("UNGM/UNOPS"), |ctx| html_adapter(Ungm, ctx)),
        AdapterSpec::new("worldbank", Some("World Bank"), |ctx| html_adapter(WorldBank, ctx)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_keys_are_unique_and_match_parsers() {
        let catalog = builtin_catalog();
        let keys: HashSet<&str> = catalog.iter().map(|s| s.key).collect();
        assert_eq!(keys.len(), catalog.len());

        let ctx = SourceContext::from_config(&crate::config::AppConfig::default()).unwrap();
        for spec in &catalog {
            let adapter = (spec.factory)(&ctx).unwrap();
            assert_eq!(adapter.name(), spec.key);
        }
    }
}
