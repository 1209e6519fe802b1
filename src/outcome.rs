//! What chains resolve to and what hooks may produce.
//!
//! A chain always resolves to an [`Outcome`]: either a [`Response`] to hand
//! back to the caller, or a [`Request`] that the caller should schedule
//! instead. Hooks produce a [`HookOutput`], which additionally allows
//! "nothing" (keep going). Which of the three a hook is allowed to produce
//! depends on its [`HookKind`](crate::HookKind); the executor validates it.

use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

/// The resolved value of a chain.
#[derive(Clone, Debug)]
pub enum Outcome {
    Response(Response),
    Request(Request),
}

impl Outcome {
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Self::Response(r) => Some(r),
            Self::Request(_) => None,
        }
    }

    pub fn as_request(&self) -> Option<&Request> {
        match self {
            Self::Request(r) => Some(r),
            Self::Response(_) => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Response(r) => Some(r),
            Self::Request(_) => None,
        }
    }

    pub fn into_request(self) -> Option<Request> {
        match self {
            Self::Request(r) => Some(r),
            Self::Response(_) => None,
        }
    }
}

impl From<Response> for Outcome {
    fn from(r: Response) -> Self { Self::Response(r) }
}

impl From<Request> for Outcome {
    fn from(r: Request) -> Self { Self::Request(r) }
}

// ── HookOutput ────────────────────────────────────────────────────────────────

/// The raw value produced by a single hook invocation.
#[derive(Clone, Debug, Default)]
pub enum HookOutput {
    /// Continue with the next hook.
    #[default]
    Nothing,
    Response(Response),
    Request(Request),
}

impl HookOutput {
    /// Name used in type-mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Response(_) => "Response",
            Self::Request(_) => "Request",
        }
    }

    /// Accepts `Nothing | Response | Request`.
    pub(crate) fn optional(self) -> Result<Option<Outcome>, HookOutput> {
        Ok(match self {
            Self::Nothing => None,
            Self::Response(r) => Some(Outcome::Response(r)),
            Self::Request(r) => Some(Outcome::Request(r)),
        })
    }

    /// Accepts `Response | Request` only.
    pub(crate) fn required(self) -> Result<Outcome, HookOutput> {
        match self {
            Self::Response(r) => Ok(Outcome::Response(r)),
            Self::Request(r) => Ok(Outcome::Request(r)),
            Self::Nothing => Err(self),
        }
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

/// Conversion into a [`HookOutput`].
///
/// Lets hooks return whatever is most natural: `()`, a bare `Response`, an
/// `Option<Request>`, and so on.
pub trait IntoHookOutput {
    fn into_hook_output(self) -> HookOutput;
}

impl IntoHookOutput for HookOutput {
    fn into_hook_output(self) -> HookOutput { self }
}

impl IntoHookOutput for () {
    fn into_hook_output(self) -> HookOutput { HookOutput::Nothing }
}

impl IntoHookOutput for Response {
    fn into_hook_output(self) -> HookOutput { HookOutput::Response(self) }
}

impl IntoHookOutput for Request {
    fn into_hook_output(self) -> HookOutput { HookOutput::Request(self) }
}

impl IntoHookOutput for Outcome {
    fn into_hook_output(self) -> HookOutput {
        match self {
            Outcome::Response(r) => HookOutput::Response(r),
            Outcome::Request(r) => HookOutput::Request(r),
        }
    }
}

impl<T: IntoHookOutput> IntoHookOutput for Option<T> {
    fn into_hook_output(self) -> HookOutput {
        self.map_or(HookOutput::Nothing, IntoHookOutput::into_hook_output)
    }
}

/// What a hook's future may resolve to: any [`IntoHookOutput`] value, or a
/// `Result` of one whose error converts into [`BoxError`].
pub trait IntoHookResult {
    fn into_hook_result(self) -> Result<HookOutput, BoxError>;
}

impl<T: IntoHookOutput, E: Into<BoxError>> IntoHookResult for Result<T, E> {
    fn into_hook_result(self) -> Result<HookOutput, BoxError> {
        self.map(IntoHookOutput::into_hook_output).map_err(Into::into)
    }
}

impl<T: IntoHookOutput> IntoHookResult for Option<T> {
    fn into_hook_result(self) -> Result<HookOutput, BoxError> { Ok(self.into_hook_output()) }
}

impl IntoHookResult for HookOutput {
    fn into_hook_result(self) -> Result<HookOutput, BoxError> { Ok(self) }
}

impl IntoHookResult for () {
    fn into_hook_result(self) -> Result<HookOutput, BoxError> { Ok(HookOutput::Nothing) }
}

impl IntoHookResult for Response {
    fn into_hook_result(self) -> Result<HookOutput, BoxError> { Ok(self.into_hook_output()) }
}

impl IntoHookResult for Request {
    fn into_hook_result(self) -> Result<HookOutput, BoxError> { Ok(self.into_hook_output()) }
}

impl IntoHookResult for Outcome {
    fn into_hook_result(self) -> Result<HookOutput, BoxError> { Ok(self.into_hook_output()) }
}
