//! Unqualified source-tree pass: instances, then definitions.

use super::objects::{walk_region, RegionType};
use super::{MetricSet, WalkContext};
use crate::database::{CoverageDatabase, Relation};
use crate::handle::{Cursor, Handle};
use crate::result::WalkResult;
use crate::visitor::Visitor;

/// An instance whose children are still being walked
struct InstanceFrame<'db, D: CoverageDatabase + ?Sized> {
    children: Option<Cursor<'db, D>>,
    instance: Handle<'db, D>,
}

pub(super) fn walk_instances<'db, D, V>(
    ctx: &mut WalkContext<'_, V>,
    design: &Handle<'db, D>,
    metrics: &MetricSet<'db, D>,
) -> WalkResult<()>
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    let _span = tracing::debug_span!("instances").entered();
    let Some(mut tops) = ctx.check(design.iterate(Relation::Instances))? else {
        return Ok(());
    };
    while let Some(top) = ctx.scan(&mut tops)? {
        walk_instance_tree(ctx, top, metrics)?;
    }
    Ok(())
}

/// Depth-first over one instance tree
///
/// A parent's qualified views are walked after its last child finished,
/// then the parent itself finishes.
fn walk_instance_tree<'db, D, V>(
    ctx: &mut WalkContext<'_, V>,
    root: Handle<'db, D>,
    metrics: &MetricSet<'db, D>,
) -> WalkResult<()>
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    let mut stack: Vec<InstanceFrame<'db, D>> = Vec::new();
    if let Some(frame) = enter_instance(ctx, root)? {
        stack.push(frame);
    }

    while let Some(frame) = stack.last_mut() {
        let child = match frame.children.as_mut() {
            Some(children) => ctx.scan(children)?,
            None => None,
        };
        match child {
            Some(child) => {
                if let Some(frame) = enter_instance(ctx, child)? {
                    stack.push(frame);
                }
            }
            None => {
                if let Some(frame) = stack.pop() {
                    leave_instance(ctx, frame, metrics)?;
                }
            }
        }
    }
    Ok(())
}

fn enter_instance<'db, D, V>(
    ctx: &mut WalkContext<'_, V>,
    instance: Handle<'db, D>,
) -> WalkResult<Option<InstanceFrame<'db, D>>>
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    let Some(instance) = ctx.promote(instance)? else {
        return Ok(None);
    };
    ctx.summary.instances += 1;
    ctx.visitor.start_instance(&instance);
    let children = ctx.check(instance.iterate(Relation::Instances))?;
    Ok(Some(InstanceFrame { children, instance }))
}

fn leave_instance<'db, D, V>(
    ctx: &mut WalkContext<'_, V>,
    frame: InstanceFrame<'db, D>,
    metrics: &MetricSet<'db, D>,
) -> WalkResult<()>
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    let InstanceFrame { children, instance } = frame;
    drop(children);

    for metric in metrics.regional() {
        let view = ctx.check(instance.qualified_handle(metric.handle(), Relation::Identity))?;
        match view {
            Some(view) => walk_region(ctx, &view, metric, RegionType::Instance)?,
            None => tracing::trace!(
                instance = %instance.raw(),
                metric = metric.name(),
                "no qualified view"
            ),
        }
    }

    ctx.visitor.finish_instance(&instance);
    Ok(())
}

pub(super) fn walk_definitions<'db, D, V>(
    ctx: &mut WalkContext<'_, V>,
    design: &Handle<'db, D>,
    metrics: &MetricSet<'db, D>,
) -> WalkResult<()>
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    let _span = tracing::debug_span!("definitions").entered();
    let Some(mut definitions) = ctx.check(design.iterate(Relation::Definitions))? else {
        return Ok(());
    };
    while let Some(definition) = ctx.scan(&mut definitions)? {
        let Some(definition) = ctx.promote(definition)? else {
            continue;
        };
        ctx.summary.definitions += 1;
        ctx.visitor.start_definition(&definition);

        for metric in metrics.regional() {
            let variants =
                ctx.check(definition.qualified_iterate(metric.handle(), Relation::Definitions))?;
            let Some(mut variants) = variants else {
                continue;
            };
            while let Some(variant) = ctx.scan(&mut variants)? {
                walk_region(ctx, &variant, metric, RegionType::Definition)?;
            }
        }

        ctx.visitor.finish_definition(&definition);
    }
    Ok(())
}
