// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Recording sender used by the client tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{BatchRequest, BatchResponse, Key, KvError, Method, Request, TxnId, TxnStatus};
use crate::time::HlcClock;

use super::{Context, Db, DbConfig, RetryOptions, Sender};

type Hook = Box<dyn Fn(&BatchRequest) -> Result<(), KvError> + Send + Sync>;
type PostHook = Box<dyn Fn(&BatchRequest, BatchResponse) -> Result<BatchResponse, KvError> + Send + Sync>;

/// Everything the test sender was asked to send, in order.
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    batches: Arc<Mutex<Vec<BatchRequest>>>,
}

impl Recorder {
    /// Methods of every batch sent, flattened in send order.
    pub(crate) fn methods(&self) -> Vec<Method> {
        self.batches
            .lock()
            .iter()
            .flat_map(BatchRequest::methods)
            .collect()
    }

    pub(crate) fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    pub(crate) fn count(&self, method: Method) -> usize {
        self.methods().into_iter().filter(|m| *m == method).count()
    }

    /// Commit flags of every `EndTransaction` sent.
    pub(crate) fn end_txns(&self) -> Vec<bool> {
        self.batches
            .lock()
            .iter()
            .filter_map(BatchRequest::end_transaction)
            .collect()
    }

    pub(crate) fn batches(&self) -> Vec<BatchRequest> {
        self.batches.lock().clone()
    }

    fn record(&self, ba: &BatchRequest) {
        self.batches.lock().push(ba.clone());
    }
}

/// Mimics the store side of a transaction: assigns identity and a timestamp
/// on first contact, marks the record writing once a write or end marker is
/// seen and sets the final status from the end marker.
///
/// `fail` runs before the reply is built and may inject an error; `post`
/// may rewrite the reply.
pub(crate) struct TestSender {
    recorder: Recorder,
    clock: HlcClock,
    txn_id: TxnId,
    fail: Option<Hook>,
    post: Option<PostHook>,
}

impl TestSender {
    pub(crate) fn new() -> Self {
        Self {
            recorder: Recorder::default(),
            clock: HlcClock::default(),
            txn_id: TxnId::new_random(),
            fail: None,
            post: None,
        }
    }

    pub(crate) fn with_fail(
        mut self,
        fail: impl Fn(&BatchRequest) -> Result<(), KvError> + Send + Sync + 'static,
    ) -> Self {
        self.fail = Some(Box::new(fail));
        self
    }

    pub(crate) fn with_post(
        mut self,
        post: impl Fn(&BatchRequest, BatchResponse) -> Result<BatchResponse, KvError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.post = Some(Box::new(post));
        self
    }

    pub(crate) fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }

    /// Wraps the sender in a client whose retries back off for 1ms.
    pub(crate) fn into_db(self) -> (Db, Recorder) {
        let recorder = self.recorder();
        let config = DbConfig::default().with_retry(
            RetryOptions::default()
                .with_initial_backoff(std::time::Duration::from_millis(1))
                .with_max_backoff(std::time::Duration::from_millis(1))
                .with_max_retries(10),
        );
        (Db::with_config(Arc::new(self), config), recorder)
    }
}

#[async_trait]
impl Sender for TestSender {
    async fn send(&self, _ctx: &Context, mut ba: BatchRequest) -> Result<BatchResponse, KvError> {
        self.recorder.record(&ba);

        if let Some(txn) = ba.header.txn.as_mut() {
            if txn.id.is_none() {
                txn.id = Some(self.txn_id);
                if txn.key.is_empty() {
                    txn.key = Key::from("test-txn");
                }
            }
            if txn.timestamp.is_zero() {
                txn.timestamp = self.clock.now();
            } else {
                self.clock.update(txn.timestamp);
            }
        }

        if let Some(fail) = &self.fail {
            fail(&ba)?;
        }

        let mut br = ba.create_reply();
        let mut writing = ba.is_write();
        let mut status = TxnStatus::Pending;
        if let Some(commit) = ba.end_transaction() {
            writing = true;
            status = if commit {
                TxnStatus::Committed
            } else {
                TxnStatus::Aborted
            };
        }
        if let Some(txn) = br.txn.as_mut() {
            txn.writing |= writing;
            txn.status = status;
        }

        match &self.post {
            Some(post) => post(&ba, br),
            None => Ok(br),
        }
    }
}

/// Returns the key of the `BeginTransaction` in `ba`, if any.
pub(crate) fn begin_key(ba: &BatchRequest) -> Option<Key> {
    match ba.get_arg(Method::BeginTransaction) {
        Some(Request::BeginTransaction { key }) => Some(key.clone()),
        _ => None,
    }
}
