pub use log::{debug, trace};
pub use serde::{Deserialize, Serialize};
pub use std::convert::TryFrom;
pub use std::fmt::{self, Debug, Display, Formatter};
pub use std::str::FromStr;
