//! Shared test fixtures
//!
//! - `MemoryStore`: an in-process record store speaking the wire protocol,
//!   with a manual clock for expiry tests
//! - `MockCluster`: a `Connector` routing to the store, with per-host
//!   outages, delays and send failures, plus per-key delays
//! - TCP helpers serving the store (promptly, slowly or not at all) on a
//!   loopback port

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use recordkv::network::{Connector, Transport};
use recordkv::operation::{BinSelector, Operation};
use recordkv::protocol::{
    decode_request, encode_response, read_frame, write_frame, Request, RequestBody, RequestKind,
    Response, ResponseBody, ResultCode,
};
use recordkv::{
    ClientConfig, ClientError, Expiration, GenerationPolicy, Host, Key, Record, Session, Value,
};

// =============================================================================
// In-memory Store
// =============================================================================

struct Stored {
    bins: BTreeMap<String, Value>,
    generation: u32,
    expires_at: Option<Instant>,
}

/// Record store with server-side semantics for tests
pub struct MemoryStore {
    records: Mutex<HashMap<Key, Stored>>,
    epoch: Instant,
    offset: Mutex<Duration>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(HashMap::new()),
            epoch: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        })
    }

    /// Move the store clock forward
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    fn now(&self) -> Instant {
        self.epoch + *self.offset.lock()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }

    /// Decode a request frame, apply it and encode the response frame
    pub fn handle_frame(&self, frame: &[u8]) -> Vec<u8> {
        let response = match decode_request(frame) {
            Ok(request) => self.apply(request),
            Err(e) => Response::error(ResultCode::ParameterError, &e.to_string()),
        };
        encode_response(&response).expect("encode response")
    }

    pub fn apply(&self, request: Request) -> Response {
        let now = self.now();
        let header = request.header;
        let mut records = self.records.lock();
        records.retain(|_, stored| stored.expires_at.map_or(true, |at| now < at));

        match request.body {
            RequestBody::Ping => Response::ok(ResponseBody::Pong),

            RequestBody::Put { key, bins } => {
                if let Err(resp) = check_generation(records.get(&key), header.generation) {
                    return resp;
                }
                let stored = records.entry(key).or_insert_with(empty_stored);
                for bin in bins {
                    if bin.value.is_null() {
                        stored.bins.remove(&bin.name);
                    } else {
                        stored.bins.insert(bin.name, bin.value);
                    }
                }
                finish_write(stored, header.expiration, now);
                Response::ok(ResponseBody::Empty)
            }

            RequestBody::Add { key, bins } => {
                if let Err(resp) = check_generation(records.get(&key), header.generation) {
                    return resp;
                }
                let mut next = records
                    .get(&key)
                    .map(|s| s.bins.clone())
                    .unwrap_or_default();
                for bin in bins {
                    if let Err(resp) = increment(&mut next, &bin.name, &bin.value) {
                        return resp;
                    }
                }
                let stored = records.entry(key).or_insert_with(empty_stored);
                stored.bins = next;
                finish_write(stored, header.expiration, now);
                Response::ok(ResponseBody::Empty)
            }

            RequestBody::Get { key, bins } => match records.get(&key) {
                Some(stored) => Response::ok(ResponseBody::Record(snapshot(stored, bins.as_deref(), now))),
                None => Response::not_found(),
            },

            RequestBody::GetHeader { key } => match records.get(&key) {
                Some(stored) => Response::ok(ResponseBody::Record(Record::new(
                    BTreeMap::new(),
                    stored.generation,
                    ttl_secs(stored, now),
                ))),
                None => Response::not_found(),
            },

            RequestBody::Exists { key } => {
                Response::ok(ResponseBody::Exists(records.contains_key(&key)))
            }

            RequestBody::Delete { key } => {
                Response::ok(ResponseBody::Deleted(records.remove(&key).is_some()))
            }

            RequestBody::Operate { key, operations } => {
                let writes = operations.iter().any(Operation::is_write);
                let existing = records.get(&key);
                if existing.is_none() && !writes {
                    return Response::not_found();
                }
                if writes {
                    if let Err(resp) = check_generation(existing, header.generation) {
                        return resp;
                    }
                }

                let mut bins = existing.map(|s| s.bins.clone()).unwrap_or_default();
                let mut result = BTreeMap::new();
                for op in operations {
                    match op {
                        Operation::Read(BinSelector::All) => {
                            result.extend(bins.iter().map(|(k, v)| (k.clone(), v.clone())));
                        }
                        Operation::Read(BinSelector::Named(name)) => {
                            if let Some(value) = bins.get(&name) {
                                result.insert(name, value.clone());
                            }
                        }
                        Operation::Write(bin) => {
                            if bin.value.is_null() {
                                bins.remove(&bin.name);
                            } else {
                                bins.insert(bin.name, bin.value);
                            }
                        }
                        Operation::Increment { bin, delta } => {
                            if let Err(resp) = increment(&mut bins, &bin, &delta) {
                                return resp;
                            }
                        }
                        Operation::Delete(name) => {
                            bins.remove(&name);
                        }
                        Operation::Touch => {}
                    }
                }

                let (generation, ttl) = if writes {
                    let stored = records.entry(key).or_insert_with(empty_stored);
                    stored.bins = bins;
                    finish_write(stored, header.expiration, now);
                    (stored.generation, ttl_secs(stored, now))
                } else {
                    let stored = existing.expect("checked above");
                    (stored.generation, ttl_secs(stored, now))
                };
                Response::ok(ResponseBody::Record(Record::new(result, generation, ttl)))
            }

            RequestBody::BatchGet { keys, bins } => {
                let results = keys
                    .iter()
                    .map(|key| records.get(key).map(|s| snapshot(s, bins.as_deref(), now)))
                    .collect();
                Response::ok(ResponseBody::Batch(results))
            }
        }
    }
}

fn empty_stored() -> Stored {
    Stored {
        bins: BTreeMap::new(),
        generation: 0,
        expires_at: None,
    }
}

fn check_generation(stored: Option<&Stored>, policy: GenerationPolicy) -> Result<(), Response> {
    match policy {
        GenerationPolicy::None => Ok(()),
        GenerationPolicy::ExpectEqual(expected) => {
            let actual = stored.map_or(0, |s| s.generation);
            if actual == expected {
                Ok(())
            } else {
                Err(Response::error(
                    ResultCode::GenerationMismatch,
                    &format!("expected generation {}, found {}", expected, actual),
                ))
            }
        }
    }
}

fn increment(bins: &mut BTreeMap<String, Value>, name: &str, delta: &Value) -> Result<(), Response> {
    let current = bins.get(name).cloned();
    let next = match (current, delta) {
        (None, Value::Int(d)) => Value::Int(*d),
        (None, Value::Float(d)) => Value::Float(*d),
        (Some(Value::Int(v)), Value::Int(d)) => Value::Int(v.wrapping_add(*d)),
        (Some(Value::Float(v)), Value::Float(d)) => Value::Float(v + d),
        (Some(v), d) => {
            return Err(Response::error(
                ResultCode::BinTypeMismatch,
                &format!("cannot add {} to {} bin '{}'", d.type_name(), v.type_name(), name),
            ))
        }
        (None, d) => {
            return Err(Response::error(
                ResultCode::ParameterError,
                &format!("non-numeric delta {}", d.type_name()),
            ))
        }
    };
    bins.insert(name.to_string(), next);
    Ok(())
}

fn finish_write(stored: &mut Stored, expiration: Expiration, now: Instant) {
    stored.generation += 1;
    match expiration {
        Expiration::Never => stored.expires_at = None,
        Expiration::KeepExisting => {}
        Expiration::Seconds(secs) => {
            stored.expires_at = Some(now + Duration::from_secs(secs as u64))
        }
    }
}

fn ttl_secs(stored: &Stored, now: Instant) -> Option<u32> {
    stored.expires_at.map(|at| {
        let left = at.saturating_duration_since(now);
        // Round up so a live record never reports zero
        left.as_millis().div_ceil(1000) as u32
    })
}

fn snapshot(stored: &Stored, names: Option<&[String]>, now: Instant) -> Record {
    let bins = match names {
        None => stored.bins.clone(),
        Some(names) => names
            .iter()
            .filter_map(|n| stored.bins.get(n).map(|v| (n.clone(), v.clone())))
            .collect(),
    };
    Record::new(bins, stored.generation, ttl_secs(stored, now))
}

// =============================================================================
// Mock Cluster (Connector)
// =============================================================================

#[derive(Default)]
struct ClusterState {
    down: Mutex<HashSet<Host>>,
    failing: Mutex<HashSet<Host>>,
    delays: Mutex<HashMap<Host, Duration>>,
    key_delays: Mutex<HashMap<Key, Duration>>,
    log: Mutex<Vec<(Host, RequestKind)>>,
    connects: AtomicUsize,
}

/// In-process cluster: every host is served by the same `MemoryStore`
#[derive(Clone)]
pub struct MockCluster {
    store: Arc<MemoryStore>,
    state: Arc<ClusterState>,
}

impl MockCluster {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            state: Arc::new(ClusterState::default()),
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Refuse new connections to `host`
    pub fn set_down(&self, host: &Host) {
        self.state.down.lock().insert(host.clone());
    }

    /// Fail every send to `host` with a network error
    pub fn set_failing(&self, host: &Host) {
        self.state.failing.lock().insert(host.clone());
    }

    /// Delay every response from `host`
    pub fn set_delay(&self, host: &Host, delay: Duration) {
        self.state.delays.lock().insert(host.clone(), delay);
    }

    /// Delay every response to a request for `key`, on any host
    pub fn set_key_delay(&self, key: &Key, delay: Duration) {
        self.state.key_delays.lock().insert(key.clone(), delay);
    }

    pub fn clear_faults(&self) {
        self.state.down.lock().clear();
        self.state.failing.lock().clear();
        self.state.delays.lock().clear();
        self.state.key_delays.lock().clear();
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<(Host, RequestKind)> {
        self.state.log.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.log.lock().len()
    }

    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }
}

impl Connector for MockCluster {
    fn connect(&self, host: &Host, _timeout: Duration) -> recordkv::Result<Box<dyn Transport>> {
        if self.state.down.lock().contains(host) {
            return Err(ClientError::Connection(format!("{} refused", host)));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransport {
            host: host.clone(),
            cluster: self.clone(),
        }))
    }
}

struct MockTransport {
    host: Host,
    cluster: MockCluster,
}

impl Transport for MockTransport {
    fn send(&mut self, request: &[u8], deadline: Instant) -> recordkv::Result<Vec<u8>> {
        let decoded = decode_request(request).map_err(|e| ClientError::Protocol(e.to_string()))?;
        self.cluster.state.log.lock().push((self.host.clone(), decoded.kind()));

        if self.cluster.state.failing.lock().contains(&self.host) {
            return Err(ClientError::Network(format!("{} reset", self.host)));
        }

        let key_delay = request_key(&decoded.body)
            .and_then(|key| self.cluster.state.key_delays.lock().get(key).copied());
        let delay = key_delay.or_else(|| self.cluster.state.delays.lock().get(&self.host).copied());
        if let Some(delay) = delay {
            let ready_at = Instant::now() + delay;
            if ready_at > deadline {
                thread::sleep(deadline.saturating_duration_since(Instant::now()));
                return Err(ClientError::Timeout(format!("{} too slow", self.host)));
            }
            thread::sleep(delay);
        }

        Ok(self.cluster.store.handle_frame(request))
    }
}

fn request_key(body: &RequestBody) -> Option<&Key> {
    match body {
        RequestBody::Put { key, .. }
        | RequestBody::Add { key, .. }
        | RequestBody::Get { key, .. }
        | RequestBody::GetHeader { key }
        | RequestBody::Exists { key }
        | RequestBody::Delete { key }
        | RequestBody::Operate { key, .. } => Some(key),
        RequestBody::Ping | RequestBody::BatchGet { .. } => None,
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// `count` distinct mock hosts
pub fn hosts(count: usize) -> Vec<Host> {
    (0..count).map(|i| Host::new(format!("node-{}", i), 3000)).collect()
}

pub fn config(seeds: Vec<Host>) -> ClientConfig {
    ClientConfig::builder().seeds(seeds).build()
}

/// Session over `nodes` mock hosts sharing one fresh store
pub fn mock_session(nodes: usize) -> (MockCluster, Session) {
    let cluster = MockCluster::new(MemoryStore::new());
    let session = Session::connect_with(config(hosts(nodes)), Arc::new(cluster.clone()))
        .expect("connect mock cluster");
    (cluster, session)
}

// =============================================================================
// TCP Helpers
// =============================================================================

/// Serve `store` over TCP on a loopback port
pub fn spawn_tcp_server(store: Arc<MemoryStore>) -> Host {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(_) => break,
            };
            let store = Arc::clone(&store);
            thread::spawn(move || serve(stream, store));
        }
    });

    Host::new("127.0.0.1", port)
}

fn serve(stream: TcpStream, store: Arc<MemoryStore>) {
    let read_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut reader = BufReader::new(read_stream);
    let mut writer = BufWriter::new(stream);

    while let Ok(frame) = read_frame(&mut reader) {
        let response = store.handle_frame(&frame);
        if write_frame(&mut writer, &response).is_err() {
            break;
        }
    }
}

/// Serve `store` over TCP, writing each reply one byte per `interval`
pub fn spawn_trickle_server(store: Arc<MemoryStore>, interval: Duration) -> Host {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(_) => break,
            };
            let store = Arc::clone(&store);
            thread::spawn(move || trickle(stream, store, interval));
        }
    });

    Host::new("127.0.0.1", port)
}

fn trickle(mut stream: TcpStream, store: Arc<MemoryStore>, interval: Duration) {
    let mut reader = match stream.try_clone() {
        Ok(s) => BufReader::new(s),
        Err(_) => return,
    };

    while let Ok(frame) = read_frame(&mut reader) {
        let response = store.handle_frame(&frame);
        for byte in response {
            thread::sleep(interval);
            if stream.write_all(&[byte]).is_err() {
                return;
            }
        }
    }
}

/// Accept connections and read requests without ever replying
pub fn spawn_silent_server() -> Host {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(_) => break,
            };
            thread::spawn(move || {
                let mut reader = BufReader::new(stream);
                while read_frame(&mut reader).is_ok() {}
            });
        }
    });

    Host::new("127.0.0.1", port)
}

/// A loopback port with nothing listening
pub fn closed_port_host() -> Host {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    Host::new("127.0.0.1", port)
}
