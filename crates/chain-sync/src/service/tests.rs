use super::*;
use crate::domain::is_valid_chain;

// Mock implementations for testing
struct MockLink {
    addr: String,
    sent: Mutex<Vec<SyncMessage>>,
    closed: bool,
}

impl MockLink {
    fn open(addr: &str) -> Arc<Self> {
        Arc::new(Self {
            addr: addr.to_string(),
            sent: Mutex::new(Vec::new()),
            closed: false,
        })
    }

    fn closed(addr: &str) -> Arc<Self> {
        Arc::new(Self {
            addr: addr.to_string(),
            sent: Mutex::new(Vec::new()),
            closed: true,
        })
    }

    fn take(&self) -> Vec<SyncMessage> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl PeerLink for MockLink {
    fn remote_addr(&self) -> String {
        self.addr.clone()
    }

    fn send(&self, message: &SyncMessage) -> Result<(), SyncError> {
        if self.closed {
            return Err(SyncError::PeerDisconnected);
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

struct FixedClock(u64);

impl TimeSource for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

fn service() -> ChainSyncService<FixedClock> {
    ChainSyncService::with_clock(SyncConfig::default(), FixedClock(1_700_000_000))
}

/// Connects a mock peer and discards its handshake query.
fn connect(svc: &ChainSyncService<FixedClock>, addr: &str) -> (ConnectionId, Arc<MockLink>) {
    let link = MockLink::open(addr);
    let id = svc.on_connected(link.clone());
    assert_eq!(link.take(), vec![SyncMessage::QueryLatest]);
    (id, link)
}

fn remote_chain(len: usize, tag: &str) -> Vec<Block> {
    let mut chain = vec![genesis_block()];
    while chain.len() < len {
        let tip = chain.last().unwrap().clone();
        chain.push(Block::next(&tip, format!("{tag}-{}", chain.len()), 5_000));
    }
    chain
}

#[test]
fn test_starts_with_genesis() {
    let svc = service();
    assert_eq!(svc.blocks(), vec![genesis_block()]);
    assert_eq!(svc.latest_block(), genesis_block());
    assert_eq!(svc.height(), 1);
}

#[test]
fn test_connect_sends_handshake_and_lists_peer() {
    let svc = service();
    let link = MockLink::open("ws://peer:6001");
    svc.on_connected(link.clone());

    assert_eq!(link.take(), vec![SyncMessage::QueryLatest]);
    assert_eq!(svc.peers(), vec!["ws://peer:6001".to_string()]);
}

#[test]
fn test_failed_handshake_drops_peer() {
    let svc = service();
    svc.on_connected(MockLink::closed("ws://dead"));
    assert!(svc.peers().is_empty());
}

#[test]
fn test_disconnect_is_idempotent() {
    let svc = service();
    let (id, _link) = connect(&svc, "ws://a");
    svc.on_disconnected(id);
    svc.on_disconnected(id);
    assert!(svc.peers().is_empty());
}

#[test]
fn test_query_latest_replies_to_sender_only() {
    let svc = service();
    let (a, link_a) = connect(&svc, "ws://a");
    let (_b, link_b) = connect(&svc, "ws://b");

    svc.handle_message(a, SyncMessage::QueryLatest);

    assert_eq!(link_a.take(), vec![SyncMessage::latest(&genesis_block())]);
    assert!(link_b.take().is_empty());
}

#[test]
fn test_query_all_replies_with_whole_chain() {
    let svc = service();
    svc.submit_block("one".into()).unwrap();
    let (a, link_a) = connect(&svc, "ws://a");

    svc.handle_message(a, SyncMessage::QueryAll);

    assert_eq!(link_a.take(), vec![SyncMessage::ResponseChain(svc.blocks())]);
}

#[test]
fn test_submit_block_appends_and_broadcasts() {
    let svc = service();
    let (_a, link_a) = connect(&svc, "ws://a");
    let (_b, link_b) = connect(&svc, "ws://b");

    let block = svc.submit_block("payload".into()).unwrap();

    assert_eq!(block.index, 1);
    assert_eq!(block.previous_hash, genesis_block().hash);
    assert_eq!(block.timestamp, 1_700_000_000);
    assert_eq!(svc.latest_block(), block);
    assert_eq!(link_a.take(), vec![SyncMessage::latest(&block)]);
    assert_eq!(link_b.take(), vec![SyncMessage::latest(&block)]);
}

#[test]
fn test_own_tip_is_noop_without_broadcast() {
    let svc = service();
    svc.submit_block("one".into()).unwrap();
    let (a, link_a) = connect(&svc, "ws://a");
    let before = svc.blocks();

    svc.handle_message(a, SyncMessage::latest(&svc.latest_block()));

    assert_eq!(svc.blocks(), before);
    assert!(link_a.take().is_empty());
}

// Scenario 1: genesis-only node receives the next block
#[test]
fn test_extends_with_linking_block() {
    let svc = service();
    let (a, link_a) = connect(&svc, "ws://a");
    let (_b, link_b) = connect(&svc, "ws://b");
    let block1 = Block::next(&genesis_block(), "first", 10);

    svc.handle_message(a, SyncMessage::latest(&block1));

    assert_eq!(svc.blocks(), vec![genesis_block(), block1.clone()]);
    assert_eq!(link_a.take(), vec![SyncMessage::latest(&block1)]);
    assert_eq!(link_b.take(), vec![SyncMessage::latest(&block1)]);
}

// Scenario 2: single non-linking tip asks everyone for full chains
#[test]
fn test_non_linking_tip_broadcasts_query_all() {
    let svc = service();
    let (a, link_a) = connect(&svc, "ws://a");
    let (_b, link_b) = connect(&svc, "ws://b");
    let mut stranger = Block::next(&genesis_block(), "far ahead", 10);
    stranger.index = 5;
    stranger.previous_hash = "not-our-tip".into();

    svc.handle_message(a, SyncMessage::latest(&stranger));

    assert_eq!(svc.blocks(), vec![genesis_block()]);
    assert_eq!(link_a.take(), vec![SyncMessage::QueryAll]);
    assert_eq!(link_b.take(), vec![SyncMessage::QueryAll]);
}

#[test]
fn test_non_linking_tip_queries_origin_when_scoped() {
    let config = SyncConfig {
        query_all_scope: QueryAllScope::Origin,
    };
    let svc = ChainSyncService::with_clock(config, FixedClock(1));
    let (a, link_a) = connect(&svc, "ws://a");
    let (_b, link_b) = connect(&svc, "ws://b");
    let tip = remote_chain(4, "r").pop().unwrap();

    svc.handle_message(a, SyncMessage::latest(&tip));

    assert_eq!(link_a.take(), vec![SyncMessage::QueryAll]);
    assert!(link_b.take().is_empty());
}

// Scenario 3: longer valid chain replaces ours, only the new tip is gossiped
#[test]
fn test_replaces_with_longer_chain() {
    let svc = service();
    svc.submit_block("local".into()).unwrap();
    let (a, link_a) = connect(&svc, "ws://a");
    let remote = remote_chain(5, "remote");

    svc.handle_message(a, SyncMessage::ResponseChain(remote.clone()));

    assert_eq!(svc.blocks(), remote);
    let gossip = link_a.take();
    assert_eq!(gossip, vec![SyncMessage::latest(&remote[4])]);
    assert_eq!(remote[4].index, 4);
}

// Scenario 4: tampered chain is rejected silently
#[test]
fn test_rejects_tampered_chain() {
    let svc = service();
    let (a, link_a) = connect(&svc, "ws://a");
    let mut remote = remote_chain(3, "remote");
    remote[2].data = "tampered".into();

    svc.handle_message(a, SyncMessage::ResponseChain(remote));

    assert_eq!(svc.blocks(), vec![genesis_block()]);
    assert!(link_a.take().is_empty());
}

#[test]
fn test_sparse_payload_not_longer_than_local_is_rejected() {
    let svc = service();
    let (a, link_a) = connect(&svc, "ws://a");
    for i in 0..3 {
        svc.submit_block(format!("local-{i}")).unwrap();
    }
    link_a.take();
    let before = svc.blocks();

    let remote = remote_chain(7, "remote");
    let sparse = vec![remote[2].clone(), remote[6].clone()];
    svc.handle_message(a, SyncMessage::ResponseChain(sparse));

    assert_eq!(svc.blocks(), before);
    assert!(link_a.take().is_empty());
}

#[test]
fn test_garbage_frame_is_dropped() {
    let svc = service();
    let (a, link_a) = connect(&svc, "ws://a");

    svc.handle_frame(a, "{not json");
    svc.handle_frame(a, r#"{"type":2,"data":"garbage"}"#);

    assert_eq!(svc.blocks(), vec![genesis_block()]);
    assert!(link_a.take().is_empty());
}

#[test]
fn test_frame_dispatch() {
    let svc = service();
    let (a, link_a) = connect(&svc, "ws://a");

    svc.handle_frame(a, r#"{"type":0}"#);

    assert_eq!(link_a.take(), vec![SyncMessage::latest(&genesis_block())]);
}

#[test]
fn test_two_nodes_converge() {
    // Wire two services together through mock links and pump messages by hand.
    let left = service();
    let right = service();
    for i in 0..3 {
        right.submit_block(format!("r{i}")).unwrap();
    }

    let (l_id, to_right) = connect(&left, "ws://right");
    let (r_id, to_left) = connect(&right, "ws://left");

    right.handle_message(r_id, SyncMessage::QueryLatest);
    for _ in 0..4 {
        for message in to_left.take() {
            left.handle_message(l_id, message);
        }
        for message in to_right.take() {
            right.handle_message(r_id, message);
        }
    }

    assert_eq!(left.blocks(), right.blocks());
    assert!(is_valid_chain(&left.blocks()));
    assert_eq!(left.height(), 4);
}

#[test]
fn test_resync_queries_every_peer() {
    let svc = service();
    let (_a, link_a) = connect(&svc, "ws://a");
    let (_b, link_b) = connect(&svc, "ws://b");

    assert_eq!(svc.request_latest_from_all(), 2);
    assert_eq!(link_a.take(), vec![SyncMessage::QueryLatest]);
    assert_eq!(link_b.take(), vec![SyncMessage::QueryLatest]);
}
