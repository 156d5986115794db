//! Covergroup pass.

use super::objects::{walk_region, RegionType};
use super::{MetricSet, WalkContext};
use crate::database::{CoverageDatabase, Relation};
use crate::handle::Handle;
use crate::result::WalkResult;
use crate::visitor::Visitor;

/// Walk every covergroup variant, then every instance of that variant
pub(super) fn walk_covergroups<'db, D, V>(
    ctx: &mut WalkContext<'_, V>,
    test: &Handle<'db, D>,
    metrics: &MetricSet<'db, D>,
) -> WalkResult<()>
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    let Some(metric) = metrics.testbench() else {
        return Ok(());
    };
    let _span = tracing::debug_span!("covergroups", metric = metric.name()).entered();
    let Some(mut groups) =
        ctx.check(test.qualified_iterate(metric.handle(), Relation::Definitions))?
    else {
        return Ok(());
    };

    while let Some(group) = ctx.scan(&mut groups)? {
        let Some(group) = ctx.promote(group)? else {
            continue;
        };
        let Some(mut variants) =
            ctx.check(group.qualified_iterate(metric.handle(), Relation::Definitions))?
        else {
            continue;
        };
        while let Some(variant) = ctx.scan(&mut variants)? {
            let Some(variant) = ctx.promote(variant)? else {
                continue;
            };
            walk_region(ctx, &variant, metric, RegionType::Definition)?;

            let Some(mut instances) = ctx.check(variant.iterate(Relation::Instances))? else {
                continue;
            };
            while let Some(instance) = ctx.scan(&mut instances)? {
                let Some(instance) = ctx.promote(instance)? else {
                    continue;
                };
                walk_region(ctx, &instance, metric, RegionType::Instance)?;
            }
        }
    }
    Ok(())
}
