//! Request construction types

mod body;
mod method;
mod reconcile;
mod spec;
mod url;

pub use body::{BodyError, BodyKind, MultipartField, RequestBody, deserialize_lenient, infer_kind};
pub use method::HttpMethod;
pub use reconcile::{BodyEdit, EditableField, coerce_field, editable_fields, reconcile_body};
pub use spec::{OrderedMap, RequestSpec};
pub use self::url::{has_http_scheme, resolve_url};
