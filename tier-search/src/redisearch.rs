//! RediSearch backing index.
//!
//! Talks to a Redis server with the RediSearch module over a multiplexed
//! async connection. Only read commands are issued:
//!
//! - `FT.SEARCH <index> <expr> LIMIT <offset> <limit> SORTBY <field> DESC`
//! - `FT.SUGGET <index>:suggestions <prefix> MAX <limit>`
//! - `FT.INFO <index>` (for `num_docs`)
//! - `PING`

use redis::aio::MultiplexedConnection;
use redis::{RedisError, Value};

use crate::error::SearchError;
use crate::index::{IndexPage, IndexRequest, RawDocument, SearchIndex};

/// A [`SearchIndex`] backed by a RediSearch full-text index.
///
/// Cheap to share: every command clones the multiplexed connection handle,
/// so concurrent tier queries pipeline over one socket.
#[derive(Clone)]
pub struct RediSearchIndex {
    connection: MultiplexedConnection,
    index_name: String,
}

impl std::fmt::Debug for RediSearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RediSearchIndex")
            .field("index_name", &self.index_name)
            .finish_non_exhaustive()
    }
}

impl RediSearchIndex {
    /// Open a connection to `redis_url` and target `index_name`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the URL is invalid and
    /// [`SearchError::IndexUnreachable`] if the server cannot be reached.
    pub async fn connect(redis_url: &str, index_name: &str) -> Result<Self, SearchError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| SearchError::Config(format!("invalid redis_url: {e}")))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("connect", e))?;

        tracing::info!(index = index_name, "connected to RediSearch");

        Ok(Self {
            connection,
            index_name: index_name.to_string(),
        })
    }

    async fn run(&self, args: Vec<String>) -> Result<Value, SearchError> {
        let context = args.first().cloned().unwrap_or_default();
        let mut cmd = redis::Cmd::new();
        for arg in &args {
            cmd.arg(arg);
        }
        let mut connection = self.connection.clone();
        let value: Value = cmd
            .query_async(&mut connection)
            .await
            .map_err(|e| map_redis_error(&context, e))?;
        Ok(value)
    }
}

impl SearchIndex for RediSearchIndex {
    fn name(&self) -> &str {
        &self.index_name
    }

    async fn query(&self, request: &IndexRequest) -> Result<IndexPage, SearchError> {
        let value = self.run(search_args(&self.index_name, request)).await?;
        parse_search_reply(&value)
    }

    async fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        let value = self.run(suggest_args(&self.index_name, prefix, limit)).await?;
        parse_suggestions(&value)
    }

    async fn ping(&self) -> Result<(), SearchError> {
        self.run(vec!["PING".into()]).await.map(|_| ())
    }

    async fn document_count(&self) -> Result<u64, SearchError> {
        let value = self
            .run(vec!["FT.INFO".into(), self.index_name.clone()])
            .await?;
        parse_num_docs(&value)
    }
}

/// Arguments of the `FT.SEARCH` command for `request`.
pub fn search_args(index_name: &str, request: &IndexRequest) -> Vec<String> {
    vec![
        "FT.SEARCH".to_string(),
        index_name.to_string(),
        request.expression.clone(),
        "LIMIT".to_string(),
        request.offset.to_string(),
        request.limit.to_string(),
        "SORTBY".to_string(),
        request.sort.field.clone(),
        if request.sort.descending { "DESC" } else { "ASC" }.to_string(),
    ]
}

/// Arguments of the `FT.SUGGET` command; suggestions live under `<index>:suggestions`.
pub fn suggest_args(index_name: &str, prefix: &str, limit: usize) -> Vec<String> {
    vec![
        "FT.SUGGET".to_string(),
        format!("{index_name}:suggestions"),
        prefix.to_string(),
        "MAX".to_string(),
        limit.to_string(),
    ]
}

/// Decode an `FT.SEARCH` reply: `[total, key, [field, value, ...], key, [...], ...]`.
///
/// Documents whose field list is nil (expired between match and load) are skipped.
pub fn parse_search_reply(value: &Value) -> Result<IndexPage, SearchError> {
    let Value::Array(items) = value else {
        return Err(SearchError::MalformedReply(format!(
            "expected array reply, got {}",
            describe(value)
        )));
    };
    let (first, rest) = items
        .split_first()
        .ok_or_else(|| SearchError::MalformedReply("empty search reply".into()))?;

    let total = match first {
        Value::Int(n) => u64::try_from(*n)
            .map_err(|_| SearchError::MalformedReply(format!("negative total count {n}")))?,
        other => {
            return Err(SearchError::MalformedReply(format!(
                "expected integer total, got {}",
                describe(other)
            )))
        }
    };

    if rest.len() % 2 != 0 {
        return Err(SearchError::MalformedReply(
            "document key without field list".into(),
        ));
    }

    let mut documents = Vec::with_capacity(rest.len() / 2);
    for pair in rest.chunks_exact(2) {
        let key = text(&pair[0]).ok_or_else(|| {
            SearchError::MalformedReply(format!(
                "expected document key, got {}",
                describe(&pair[0])
            ))
        })?;
        let fields = match &pair[1] {
            Value::Array(fields) => parse_fields(fields)?,
            Value::Nil => continue,
            other => {
                return Err(SearchError::MalformedReply(format!(
                    "expected field list for {key}, got {}",
                    describe(other)
                )))
            }
        };
        documents.push(RawDocument { key, fields });
    }

    Ok(IndexPage { total, documents })
}

fn parse_fields(items: &[Value]) -> Result<Vec<(String, String)>, SearchError> {
    if items.len() % 2 != 0 {
        return Err(SearchError::MalformedReply(
            "odd number of field list entries".into(),
        ));
    }
    let mut fields = Vec::with_capacity(items.len() / 2);
    for pair in items.chunks_exact(2) {
        let name = text(&pair[0]).ok_or_else(|| {
            SearchError::MalformedReply(format!("expected field name, got {}", describe(&pair[0])))
        })?;
        // Nil values mean the field is absent on this document.
        if let Some(value) = text(&pair[1]) {
            fields.push((name, value));
        }
    }
    Ok(fields)
}

/// Decode an `FT.SUGGET` reply. Nil means no suggestions.
pub fn parse_suggestions(value: &Value) -> Result<Vec<String>, SearchError> {
    match value {
        Value::Nil => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                text(item).ok_or_else(|| {
                    SearchError::MalformedReply(format!(
                        "expected suggestion string, got {}",
                        describe(item)
                    ))
                })
            })
            .collect(),
        other => Err(SearchError::MalformedReply(format!(
            "expected suggestion array, got {}",
            describe(other)
        ))),
    }
}

/// Extract `num_docs` from an `FT.INFO` reply (flat key/value array or map).
pub fn parse_num_docs(value: &Value) -> Result<u64, SearchError> {
    let found = match value {
        Value::Array(items) => items
            .chunks_exact(2)
            .find(|pair| text(&pair[0]).as_deref() == Some("num_docs"))
            .map(|pair| &pair[1]),
        Value::Map(pairs) => pairs
            .iter()
            .find(|(k, _)| text(k).as_deref() == Some("num_docs"))
            .map(|(_, v)| v),
        other => {
            return Err(SearchError::MalformedReply(format!(
                "expected index info, got {}",
                describe(other)
            )))
        }
    };
    let raw = found
        .and_then(text)
        .ok_or_else(|| SearchError::MalformedReply("num_docs missing from index info".into()))?;

    // Older servers report num_docs as a double string such as "42".
    raw.parse::<u64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|n| *n >= 0.0).map(|n| n as u64))
        .ok_or_else(|| SearchError::MalformedReply(format!("unparseable num_docs {raw:?}")))
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::SimpleString(s) => Some(s.clone()),
        Value::Int(n) => Some(n.to_string()),
        Value::Double(d) => Some(d.to_string()),
        _ => None,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Int(_) => "integer",
        Value::BulkString(_) => "bulk string",
        Value::Array(_) => "array",
        Value::SimpleString(_) => "simple string",
        Value::Okay => "OK",
        Value::Map(_) => "map",
        Value::Double(_) => "double",
        _ => "unexpected value",
    }
}

/// Classify a client error: transport problems mean the index is unreachable,
/// anything else is a rejected request.
fn map_redis_error(context: &str, err: RedisError) -> SearchError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        SearchError::IndexUnreachable(format!("{context}: {err}"))
    } else {
        SearchError::IndexQuery(format!("{context}: {err}"))
    }
}
