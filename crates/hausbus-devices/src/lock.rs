//! Lock behavior family.
//!
//! Two generations with opposite wire semantics: the IP lock exposes
//! an explicit lock state and a target-level command parameter, the
//! RF lock folds everything into an inverted boolean plus a pulse
//! parameter for the latch.

use std::sync::Arc;

use async_trait::async_trait;

use hausbus_core::{
    BoundParameter, CallParameterCollector, DeviceResult, ParamType, ParamValue,
};

use crate::entity::{impl_composite_entity, CompositeEntity, EntityContext};
use crate::field::Field;

const LOCK_STATE_LOCKED: &str = "LOCKED";

const LOCK_TARGET_LEVEL_LOCKED: &str = "LOCKED";
const LOCK_TARGET_LEVEL_UNLOCKED: &str = "UNLOCKED";
const LOCK_TARGET_LEVEL_OPEN: &str = "OPEN";

/// Motor direction while the bolt is moving.
const DIRECTION_LOCKING: &str = "DOWN";
const DIRECTION_UNLOCKING: &str = "UP";

const ERROR_NONE: &str = "NO_ERROR";

/// Read and command interface shared by both lock generations.
#[async_trait]
pub trait Lock: CompositeEntity {
    /// None while the lock state is unknown.
    fn is_locked(&self) -> Option<bool>;
    fn is_jammed(&self) -> bool;
    fn is_locking(&self) -> Option<bool>;
    fn is_unlocking(&self) -> Option<bool>;
    async fn lock(&self) -> DeviceResult<()>;
    async fn unlock(&self) -> DeviceResult<()>;
    /// Release the latch.
    async fn open(&self) -> DeviceResult<()>;
}

fn direction_is(param: &Option<Arc<BoundParameter>>, expected: &str) -> Option<bool> {
    let value = param.as_ref()?.value()?;
    Some(value.as_str() == Some(expected))
}

// --- IP lock ----------------------------------------------------------

/// Lock with an explicit state parameter and target-level commands.
pub struct IpLock {
    ctx: EntityContext,
    lock_state: Option<Arc<BoundParameter>>,
    lock_target_level: Option<Arc<BoundParameter>>,
    direction: Option<Arc<BoundParameter>>,
}

impl IpLock {
    pub(crate) fn new(ctx: EntityContext) -> Self {
        let lock_state = ctx.binding(Field::LockState, ParamType::Enum);
        let lock_target_level = ctx.binding(Field::LockTargetLevel, ParamType::Enum);
        let direction = ctx.binding(Field::Direction, ParamType::Enum);
        Self {
            ctx,
            lock_state,
            lock_target_level,
            direction,
        }
    }

    async fn send_target_level(&self, level: &str) -> DeviceResult<()> {
        let Some(target) = &self.lock_target_level else {
            return Ok(());
        };
        let mut collector = CallParameterCollector::new();
        target
            .send_value(ParamValue::String(level.to_string()), Some(&mut collector))
            .await?;
        collector.flush(self.ctx.device().sink().as_ref()).await
    }
}

impl_composite_entity!(IpLock);

#[async_trait]
impl Lock for IpLock {
    fn is_locked(&self) -> Option<bool> {
        let value = self.lock_state.as_ref()?.value()?;
        Some(value.as_str() == Some(LOCK_STATE_LOCKED))
    }

    /// The IP lock reports no jam condition.
    fn is_jammed(&self) -> bool {
        false
    }

    fn is_locking(&self) -> Option<bool> {
        direction_is(&self.direction, DIRECTION_LOCKING)
    }

    fn is_unlocking(&self) -> Option<bool> {
        direction_is(&self.direction, DIRECTION_UNLOCKING)
    }

    async fn lock(&self) -> DeviceResult<()> {
        self.send_target_level(LOCK_TARGET_LEVEL_LOCKED).await
    }

    async fn unlock(&self) -> DeviceResult<()> {
        self.send_target_level(LOCK_TARGET_LEVEL_UNLOCKED).await
    }

    async fn open(&self) -> DeviceResult<()> {
        self.send_target_level(LOCK_TARGET_LEVEL_OPEN).await
    }
}

// --- RF lock ----------------------------------------------------------

/// Lock whose boolean state parameter is inverted on the wire: true
/// means unlocked.
pub struct RfLock {
    ctx: EntityContext,
    state: Option<Arc<BoundParameter>>,
    open: Option<Arc<BoundParameter>>,
    direction: Option<Arc<BoundParameter>>,
    error: Option<Arc<BoundParameter>>,
}

impl RfLock {
    pub(crate) fn new(ctx: EntityContext) -> Self {
        let state = ctx.binding(Field::State, ParamType::Bool);
        let open = ctx.binding(Field::Open, ParamType::Action);
        let direction = ctx.binding(Field::Direction, ParamType::Enum);
        let error = ctx.binding(Field::Error, ParamType::Enum);
        Self {
            ctx,
            state,
            open,
            direction,
            error,
        }
    }

    async fn send_state(&self, value: bool) -> DeviceResult<()> {
        let Some(state) = &self.state else {
            return Ok(());
        };
        let mut collector = CallParameterCollector::new();
        state
            .send_value(ParamValue::Bool(value), Some(&mut collector))
            .await?;
        collector.flush(self.ctx.device().sink().as_ref()).await
    }
}

impl_composite_entity!(RfLock);

#[async_trait]
impl Lock for RfLock {
    fn is_locked(&self) -> Option<bool> {
        let value = self.state.as_ref()?.value()?;
        Some(value.as_bool() != Some(true))
    }

    fn is_jammed(&self) -> bool {
        let Some(error) = &self.error else {
            return false;
        };
        match error.value().and_then(|value| value.as_str().map(String::from)) {
            Some(error) => error != ERROR_NONE,
            None => false,
        }
    }

    fn is_locking(&self) -> Option<bool> {
        direction_is(&self.direction, DIRECTION_LOCKING)
    }

    fn is_unlocking(&self) -> Option<bool> {
        direction_is(&self.direction, DIRECTION_UNLOCKING)
    }

    async fn lock(&self) -> DeviceResult<()> {
        self.send_state(false).await
    }

    async fn unlock(&self) -> DeviceResult<()> {
        self.send_state(true).await
    }

    async fn open(&self) -> DeviceResult<()> {
        let Some(open) = &self.open else {
            return Ok(());
        };
        let mut collector = CallParameterCollector::new();
        open.send_value(ParamValue::Bool(true), Some(&mut collector))
            .await?;
        collector.flush(self.ctx.device().sink().as_ref()).await
    }
}
