//! Remote goals as local solutions.
//!
//! [`rpc`] runs a goal on the server through the text encoding and unifies
//! each answer with the goal, so the caller sees one [`Bindings`] per remote
//! solution. Running out of answers is not an error here: a goal with no
//! solutions simply yields none.

use pengine_core::{HostTerm, WriteOptions, write_term};
use pengine_prolog::{Bindings, EvalError};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{Answers, Client, ClientConfig, PengineError};

/// Solutions of a remote goal.
#[derive(Debug)]
pub struct RpcAnswers {
    answers: Answers<HostTerm>,
    query: HostTerm,
    env: Bindings,
    done: bool,
}

impl RpcAnswers {
    /// The next solution, or `None` once there are no more.
    ///
    /// # Errors
    /// Returns any terminal error of the remote query other than it having
    /// no solutions.
    pub async fn next(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Bindings>, PengineError> {
        while !self.done && self.answers.next(cancel).await {
            let Some(answer) = self.answers.take_current() else {
                continue;
            };
            let mut env = self.env.clone();
            if env.unify(&self.query, &answer) {
                return Ok(Some(env));
            }
        }
        self.done = true;
        let err = self.answers.final_error();
        if let Err(close) = self.answers.close().await {
            warn!(error = %close, "failed to stop remote query");
        }
        match err {
            None | Some(PengineError::Failed) => Ok(None),
            Some(err) => Err(err),
        }
    }

    /// Stop the remote query early.
    ///
    /// # Errors
    /// Returns the transport/decode error of the stop request.
    pub async fn close(&mut self) -> Result<(), PengineError> {
        self.done = true;
        self.answers.close().await
    }

    /// The underlying result iterator.
    #[must_use]
    pub const fn answers(&self) -> &Answers<HostTerm> {
        &self.answers
    }
}

/// Run `query` on the server behind `client`.
///
/// `options` is a list that may carry `application(A)`, `chunk(N)` and
/// `src_url(U)`; they override the client's configuration for this call.
/// Other options are ignored. Variables of `query` and `options` are read
/// through `env`.
///
/// # Errors
/// Returns [`PengineError::Eval`] for a malformed option list, otherwise
/// the error of the creation request.
pub async fn rpc(
    client: &Client,
    query: &HostTerm,
    options: &HostTerm,
    env: &Bindings,
    cancel: &CancellationToken,
) -> Result<RpcAnswers, PengineError> {
    let config = rpc_config(client.config().clone(), options, env)?;
    let query = env.resolve(query);
    let mut text = String::new();
    let write = WriteOptions::quoted().with_ops(client.operators());
    write_term(&mut text, &query, &write)
        .map_err(|e| PengineError::Config(format!("cannot write query: {e}")))?;

    let answers = client
        .reconfigured(config)
        .ask_prolog(&text, cancel)
        .await?;
    Ok(RpcAnswers {
        answers,
        query,
        env: env.clone(),
        done: false,
    })
}

/// Run `query` on the server at `url`, an atom.
///
/// # Errors
/// Returns [`PengineError::Eval`] if `url` is unbound or not an atom, and
/// otherwise as [`rpc`].
#[cfg(feature = "http")]
pub async fn pengine_rpc(
    url: &HostTerm,
    query: &HostTerm,
    options: &HostTerm,
    env: &Bindings,
    cancel: &CancellationToken,
) -> Result<RpcAnswers, PengineError> {
    let url = env.resolve(url);
    let client = Client::new(ClientConfig::new(atom(&url)?));
    rpc(&client, query, options, env, cancel).await
}

fn atom(term: &HostTerm) -> Result<&str, EvalError> {
    match term {
        HostTerm::Variable(_) => Err(EvalError::Instantiation),
        other => other.as_atom().ok_or_else(|| EvalError::Type {
            expected: "atom",
            culprit: other.clone(),
        }),
    }
}

fn rpc_config(
    mut config: ClientConfig,
    options: &HostTerm,
    env: &Bindings,
) -> Result<ClientConfig, EvalError> {
    let options = env.resolve(options);
    if options.is_var() {
        return Err(EvalError::Instantiation);
    }
    let items = options.list_items().ok_or_else(|| EvalError::Type {
        expected: "list",
        culprit: options.clone(),
    })?;
    for option in items {
        match (option.functor(), option.args()) {
            (Some(("application", 1)), [value]) => {
                config.application = Some(atom(value)?.to_string());
            }
            (Some(("src_url", 1)), [value]) => {
                config.src_url = Some(atom(value)?.to_string());
            }
            (Some(("chunk", 1)), [value]) => {
                config.chunk = match value {
                    HostTerm::Variable(_) => return Err(EvalError::Instantiation),
                    HostTerm::Integer(n) => usize::try_from(*n).map_err(|_| EvalError::Type {
                        expected: "nonneg",
                        culprit: value.clone(),
                    })?,
                    other => {
                        return Err(EvalError::Type {
                            expected: "integer",
                            culprit: other.clone(),
                        });
                    }
                };
            }
            _ => {}
        }
    }
    Ok(config)
}
