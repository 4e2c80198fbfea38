//! Reader/writer races over a live table.
//!
//! One thread mutates while others read, pin, and iterate. The assertions
//! check the visibility contract: a reader sees either a fully published node
//! or nothing, and a pinned node never changes underneath its holder.

use std::thread;

use nodetab::FreshNode;
use nodetab::NodeRef;
use nodetab::NodeTab;
use nodetab::model::Attributes;
use nodetab::model::Identifier;
use nodetab::model::Node;
use nodetab::model::NodeClass;
use nodetab::model::NodeId;
use nodetab::model::Value;

const STABLE: u32 = 128;
const CHURN: u32 = 512;
const ROUNDS: usize = 64;

/// A variable node whose payload mirrors its identifier value, so any torn
/// or misdirected read is detectable.
fn mirrored(tab: &NodeTab<Node>, value: u32) -> FreshNode<Node> {
  let mut node = tab.new_node(NodeClass::Variable);

  node.set_id(NodeId::numeric(1, value));
  node.set_browse_name(format!("n{value}"));

  if let Attributes::Variable { value: slot, .. } = node.attributes_mut() {
    *slot = Value::Int32(value as i32);
  }

  node
}

fn assert_mirrored(node: &Node) {
  let Identifier::Numeric(value) = node.id().identifier() else {
    panic!("non-numeric identifier in test table");
  };

  match node.attributes() {
    Attributes::Variable {
      value: Value::Int32(payload),
      ..
    } => {
      assert_eq!(*payload, *value as i32, "payload does not mirror identifier");
      assert_eq!(node.browse_name(), format!("n{value}"));
    }
    other => panic!("unexpected attributes: {other:?}"),
  }
}

#[test]
fn readers_race_one_writer() {
  let tab: NodeTab<Node> = NodeTab::new();

  for value in 1..=STABLE {
    tab.insert(mirrored(&tab, value)).unwrap();
  }

  thread::scope(|scope| {
    scope.spawn(|| {
      // Writer: churn a disjoint range hard enough to force grows, shrinks,
      // and slot reuse while the stable range stays put.
      for round in 0..ROUNDS {
        for value in STABLE + 1..=STABLE + CHURN {
          tab.insert(mirrored(&tab, value)).unwrap();
        }

        for value in STABLE + 1..=STABLE + CHURN {
          tab.remove(&NodeId::numeric(1, value)).unwrap();
        }

        // Rewrite one stable node copy-on-write each round.
        let id: NodeId = NodeId::numeric(1, 1 + (round as u32 % STABLE));
        let copy = tab.get_copy(&id).unwrap();

        tab.replace(copy).unwrap();
      }
    });

    for _ in 0..3 {
      scope.spawn(|| {
        for round in 0..ROUNDS * 8 {
          let value: u32 = 1 + (round as u32 * 31) % STABLE;
          let id: NodeId = NodeId::numeric(1, value);
          let node: NodeRef<'_, Node> = tab.get(&id).expect("stable node vanished");

          assert_mirrored(&node);
        }
      });
    }

    scope.spawn(|| {
      for _ in 0..ROUNDS {
        for node in &tab {
          // Every yielded node is internally consistent, whatever the
          // writer is doing.
          assert_mirrored(&node);
        }
      }
    });
  });

  assert_eq!(tab.len(), STABLE as usize);
}

#[test]
fn pins_outlive_concurrent_removal() {
  let tab: NodeTab<Node> = NodeTab::new();

  for value in 1..=STABLE {
    tab.insert(mirrored(&tab, value)).unwrap();
  }

  thread::scope(|scope| {
    let pins: Vec<NodeRef<'_, Node>> = (1..=STABLE)
      .map(|value| tab.get(&NodeId::numeric(1, value)).unwrap())
      .collect();

    let remover = scope.spawn(|| {
      for value in 1..=STABLE {
        tab.remove(&NodeId::numeric(1, value)).unwrap();
      }
    });

    remover.join().unwrap();

    assert!(tab.is_empty());

    // Every pin still reads the removed node's full contents.
    for pin in &pins {
      assert_mirrored(pin);
    }
  });
}

#[test]
fn two_writers_interleave_safely() {
  let tab: NodeTab<Node> = NodeTab::new();

  thread::scope(|scope| {
    for offset in [0_u32, 10_000] {
      let tab: &NodeTab<Node> = &tab;

      scope.spawn(move || {
        for round in 0..8 {
          for value in 1..=256 {
            tab.insert(mirrored(tab, offset + value)).unwrap();
          }

          if round < 7 {
            for value in 1..=256 {
              tab.remove(&NodeId::numeric(1, offset + value)).unwrap();
            }
          }
        }
      });
    }
  });

  assert_eq!(tab.len(), 512);

  for offset in [0_u32, 10_000] {
    for value in 1..=256 {
      let node = tab.get(&NodeId::numeric(1, offset + value)).unwrap();

      assert_mirrored(&node);
    }
  }
}
