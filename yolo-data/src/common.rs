pub use crate::error::{Error, Result};
pub use bbox::{prelude::*, Corners, CxCyWH, Transform, HW};
pub use derivative::Derivative;
pub use futures::{
    future::FutureExt as _,
    stream::{self, Stream, StreamExt as _, TryStreamExt as _},
};
pub use indexmap::IndexSet;
pub use itertools::Itertools as _;
pub use ndarray::{s, Array3, Array4, ArrayView3, Axis};
pub use noisy_float::prelude::*;
pub use par_stream::prelude::*;
pub use rand::{prelude::*, rngs::StdRng};
pub use serde::{Deserialize, Deserializer, Serialize, Serializer};
pub use std::{
    fmt::{self, Debug},
    fs,
    num::NonZeroUsize,
    ops::Range,
    path::{Path, PathBuf},
    pin::Pin,
    sync::{
        atomic::{self, AtomicUsize},
        Arc,
    },
    task::{Context, Poll},
};
pub use log::{debug, info, warn};
