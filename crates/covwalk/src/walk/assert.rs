//! Assertion pass.
//!
//! Assertions are read from the test rather than from source regions so
//! that assertions in the root scope are not missed.

use super::{MetricSet, WalkContext};
use crate::database::{CoverageDatabase, Relation};
use crate::handle::Handle;
use crate::result::WalkResult;
use crate::visitor::{ObjectSite, Visitor};

/// Child names that carry an assertion's success count
const SUCCESS_BLOCK_NAMES: [&str; 2] = ["realsuccesses", "allsuccesses"];

pub(super) fn walk_assertions<'db, D, V>(
    ctx: &mut WalkContext<'_, V>,
    test: &Handle<'db, D>,
    metrics: &MetricSet<'db, D>,
) -> WalkResult<()>
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    let Some(metric) = metrics.assert() else {
        return Ok(());
    };
    let _span = tracing::debug_span!("assertions", metric = metric.name()).entered();
    let Some(mut assertions) =
        ctx.check(test.qualified_iterate(metric.handle(), Relation::Objects))?
    else {
        return Ok(());
    };

    while let Some(assertion) = ctx.scan(&mut assertions)? {
        let region = ctx.check(assertion.related(Relation::Parent))?;
        let Some(mut blocks) = ctx.check(assertion.iterate(Relation::Objects))? else {
            continue;
        };
        while let Some(block) = ctx.scan(&mut blocks)? {
            let name = ctx.check(block.name())?;
            if name
                .as_deref()
                .is_some_and(|name| SUCCESS_BLOCK_NAMES.contains(&name))
            {
                let site = ObjectSite {
                    region: region.as_ref(),
                    metric,
                    parent: Some(&assertion),
                };
                ctx.visitor.visit_cov_object(&block, site);
                ctx.summary.cov_objects += 1;
                break;
            }
        }
    }
    Ok(())
}
