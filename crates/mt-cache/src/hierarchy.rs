//! Mode hierarchy membership.

use chrono::Duration;
use mt_core::MachineModeId;

use crate::context::RequestContext;
use crate::error::RequestError;
use crate::request::CachedRequest;

/// Whether `descendant` is `ancestor` or nested below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IsDescendantOrSelfOf {
    ancestor: MachineModeId,
    descendant: MachineModeId,
}

impl IsDescendantOrSelfOf {
    pub const fn new(ancestor: MachineModeId, descendant: MachineModeId) -> Self {
        Self {
            ancestor,
            descendant,
        }
    }
}

impl CachedRequest for IsDescendantOrSelfOf {
    type Output = bool;

    fn cache_key(&self) -> String {
        format!("IsDescendantOrSelfOf.{}.{}", self.ancestor, self.descendant)
    }

    fn compute(&self, ctx: &RequestContext) -> Result<bool, RequestError> {
        if self.ancestor == self.descendant {
            return Ok(true);
        }
        let Some(ancestor) = ctx.modes.find_mode(&self.ancestor)? else {
            tracing::warn!(mode = %self.ancestor, "unknown ancestor mode");
            return Ok(false);
        };
        let Some(descendant) = ctx.modes.find_mode(&self.descendant)? else {
            tracing::warn!(mode = %self.descendant, "unknown descendant mode");
            return Ok(false);
        };
        Ok(descendant.is_descendant_or_self_of(&ancestor.id, ctx.modes.as_ref())?)
    }

    fn cache_timeout(&self, ctx: &RequestContext, _computed: &bool) -> Duration {
        ctx.ttl.hierarchy()
    }
}
