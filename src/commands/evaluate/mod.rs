use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cli::EvaluateArgs;
use crate::layout::{
    Bm25Field, Configuration, LshParams, ResultLayout, RetrievalMethod, Signal, Similarity,
    tuple_dir_name,
};
use crate::model::WikipageMapping;
use crate::scores::{Ranking, read_ranking};
use crate::util::{
    ensure_directory, now_utc_string, read_json, sha256_file, sorted_entry_names,
    write_json_pretty,
};

mod aggregate;
mod ground_truth;
mod metrics;
mod render;
mod report;
mod run;
mod sweep;

pub use run::run;

use aggregate::*;
use ground_truth::*;
use metrics::*;
use render::*;
use report::*;
use sweep::*;
