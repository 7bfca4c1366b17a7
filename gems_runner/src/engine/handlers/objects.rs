use crate::engine::{BoundArgs, EngineContext, HandlerError, HandlerResult, HandlerTable, Transition, Value};
use crate::environment::ObjectId;

pub(super) fn register(table: &mut HandlerTable) {
    table.register("ShowObject", show_object, Some("object_id"));
    table.register("HideObject", hide_object, Some("object_id"));
    table.register("AllowTake", allow_take, Some("object_id"));
    table.register("DisallowTake", disallow_take, Some("object_id"));
    table.register("PortalTo", portal_to, Some("view_id"));
}

impl EngineContext {
    /// Set `visible` on every copy of the object and mirror it on screen when
    /// the object is part of the current view.
    pub(crate) fn set_object_visible(&mut self, object_id: ObjectId, visible: bool) -> Result<(), HandlerError> {
        let mut found = false;
        for object in self.environment.objects_mut(object_id) {
            object.visible = visible;
            found = true;
        }
        if !found {
            return Err(HandlerError::ObjectDoesNotExist(object_id));
        }
        let in_view = self
            .current_view()
            .map_or(false, |view| view.objects.contains_key(&object_id));
        if in_view {
            if visible {
                self.renderer.show_object(object_id);
            } else {
                self.renderer.hide_object(object_id);
            }
        }
        Ok(())
    }

    fn set_object_takeable(&mut self, object_id: ObjectId, takeable: bool) -> Result<(), HandlerError> {
        let mut found = false;
        for object in self.environment.objects_mut(object_id) {
            object.takeable = takeable;
            found = true;
        }
        if found {
            Ok(())
        } else {
            Err(HandlerError::ObjectDoesNotExist(object_id))
        }
    }
}

fn show_object(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    ctx.set_object_visible(args.int("object_id")?, true)?;
    Ok(Value::Unit)
}

fn hide_object(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let object_id = args.int("object_id")?;
    if let Some(pocket) = ctx.pockets.holding(object_id) {
        ctx.return_from_pocket(pocket, true);
    }
    ctx.set_object_visible(object_id, false)?;
    Ok(Value::Unit)
}

fn allow_take(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    ctx.set_object_takeable(args.int("object_id")?, true)?;
    Ok(Value::Unit)
}

fn disallow_take(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    ctx.set_object_takeable(args.int("object_id")?, false)?;
    Ok(Value::Unit)
}

fn portal_to(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let view_id = args.int("view_id")?;
    if ctx.environment.view(view_id).is_none() {
        return Err(HandlerError::ViewDoesNotExist(view_id));
    }
    ctx.renderer.switch_view(view_id);
    ctx.request_transition(Transition::View { view_id });
    Ok(Value::Unit)
}
