//! Qualified-region pass and object descent.

use super::WalkContext;
use crate::database::{CoverageDatabase, Relation};
use crate::handle::{Cursor, Handle};
use crate::metric::Metric;
use crate::object::ObjectKind;
use crate::result::WalkResult;
use crate::visitor::{ObjectSite, Visitor};

/// Which hook pair brackets a qualified region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegionType {
    /// Qualified definition: `start_variant`/`finish_variant`
    Definition,
    /// Qualified instance: `start_qualified_instance`/`finish_qualified_instance`
    Instance,
}

/// A container whose children are still being walked
///
/// Fields drop in order: peeked child, children cursor, container.
struct ContainerFrame<'db, D: CoverageDatabase + ?Sized> {
    pending: Option<Handle<'db, D>>,
    children: Option<Cursor<'db, D>>,
    container: Handle<'db, D>,
}

pub(crate) fn walk_region<'db, D, V>(
    ctx: &mut WalkContext<'_, V>,
    region: &Handle<'db, D>,
    metric: &Metric<'db, D>,
    region_type: RegionType,
) -> WalkResult<()>
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    let objects = ctx.check(region.iterate(Relation::Objects))?;
    ctx.summary.qualified_regions += 1;
    match region_type {
        RegionType::Definition => ctx.visitor.start_variant(region, metric),
        RegionType::Instance => ctx.visitor.start_qualified_instance(region, metric),
    }

    if let Some(mut objects) = objects {
        while let Some(object) = ctx.scan(&mut objects)? {
            descend(ctx, object, region, metric)?;
        }
    }

    match region_type {
        RegionType::Definition => ctx.visitor.finish_variant(region, metric),
        RegionType::Instance => ctx.visitor.finish_qualified_instance(region, metric),
    }
    Ok(())
}

/// Walk one top-level object of a region and everything below it
fn descend<'db, D, V>(
    ctx: &mut WalkContext<'_, V>,
    object: Handle<'db, D>,
    region: &Handle<'db, D>,
    metric: &Metric<'db, D>,
) -> WalkResult<()>
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    let mut stack: Vec<ContainerFrame<'db, D>> = Vec::new();
    let mut next = Some(object);

    loop {
        if let Some(object) = next.take() {
            let parent = stack.last().map(|frame| &frame.container);
            let site = ObjectSite {
                region: Some(region),
                metric,
                parent,
            };
            let kind = ctx.kind_of(&object, region)?;
            if kind.is_container() {
                if let Some(frame) = open_container(ctx, object, site)? {
                    stack.push(frame);
                }
            } else if kind.is_leaf() {
                ctx.visitor.visit_leaf_object(&object, site);
                ctx.summary.leaf_objects += 1;
                if !metric.is_line() {
                    ctx.visitor.visit_cov_object(&object, site);
                    ctx.summary.cov_objects += 1;
                }
            } else {
                let code = match kind {
                    ObjectKind::Unrecognized { code } => code,
                    _ => None,
                };
                tracing::warn!(
                    object = %object.raw(),
                    code = ?code,
                    metric = metric.name(),
                    "unrecognized object type, skipping"
                );
                ctx.summary.unrecognized += 1;
            }
        }

        let Some(frame) = stack.last_mut() else {
            break;
        };
        next = match frame.pending.take() {
            Some(peeked) => Some(peeked),
            None => match frame.children.as_mut() {
                Some(children) => ctx.scan(children)?,
                None => None,
            },
        };
        if next.is_none() {
            if let Some(frame) = stack.pop() {
                let site = ObjectSite {
                    region: Some(region),
                    metric,
                    parent: stack.last().map(|frame| &frame.container),
                };
                ctx.visitor.finish_container(&frame.container, site);
            }
        }
    }
    Ok(())
}

/// Promote and start a container, peeking its first child
///
/// Under a line metric, a container whose first child is a block is itself
/// the coverable unit and gets the cov visit.
fn open_container<'db, D, V>(
    ctx: &mut WalkContext<'_, V>,
    object: Handle<'db, D>,
    site: ObjectSite<'_, 'db, D>,
) -> WalkResult<Option<ContainerFrame<'db, D>>>
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    let Some(container) = ctx.promote(object)? else {
        return Ok(None);
    };
    ctx.summary.containers += 1;
    ctx.visitor.start_container(&container, site);

    let mut frame = ContainerFrame {
        pending: None,
        children: None,
        container,
    };
    // assertion contents are reached from the test
    if site.metric.is_assert() {
        return Ok(Some(frame));
    }

    frame.children = ctx.check(frame.container.iterate(Relation::Objects))?;
    if let Some(children) = frame.children.as_mut() {
        frame.pending = ctx.scan(children)?;
    }

    if site.metric.is_line() {
        if let (Some(first), Some(region)) = (frame.pending.as_ref(), site.region) {
            if ctx.kind_of(first, region)? == ObjectKind::Block {
                ctx.visitor.visit_cov_object(&frame.container, site);
                ctx.summary.cov_objects += 1;
            }
        }
    }
    Ok(Some(frame))
}
