use std::collections::HashMap;

use proptest::prelude::*;
use skywatch::cache::BoundedCache;

#[derive(Debug, Clone)]
enum Op {
    Put(u8, u32),
    Get(u8),
    Remove(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..12, any::<u32>()).prop_map(|(k, v)| Op::Put(k, v)),
        3 => (0u8..12).prop_map(Op::Get),
        1 => (0u8..12).prop_map(Op::Remove),
    ]
}

proptest! {
    // Compares against a plain recency list: least recently touched first.
    #[test]
    fn prop_keeps_most_recently_touched(capacity in 1usize..6, ops in proptest::collection::vec(op(), 0..200)) {
        let cache = BoundedCache::new("prop", capacity).unwrap();
        let mut order: Vec<u8> = Vec::new();
        let mut values: HashMap<u8, u32> = HashMap::new();

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    cache.put(k, v);
                    order.retain(|x| *x != k);
                    order.push(k);
                    values.insert(k, v);
                    if order.len() > capacity {
                        let evicted = order.remove(0);
                        values.remove(&evicted);
                    }
                }
                Op::Get(k) => {
                    let got = cache.get(&k);
                    prop_assert_eq!(got, values.get(&k).copied());
                    if got.is_some() {
                        order.retain(|x| *x != k);
                        order.push(k);
                    }
                }
                Op::Remove(k) => {
                    prop_assert_eq!(cache.remove(&k), values.remove(&k));
                    order.retain(|x| *x != k);
                }
            }

            prop_assert!(cache.len() <= capacity);
            prop_assert_eq!(cache.keys(), order.clone());
        }
    }

    #[test]
    fn prop_overflow_evicts_exactly_the_oldest(capacity in 1usize..8) {
        let cache = BoundedCache::new("prop", capacity).unwrap();
        for k in 0..capacity {
            prop_assert_eq!(cache.put(k, ()), None);
        }

        prop_assert_eq!(cache.put(capacity, ()), Some(0));
        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(!cache.contains(&0));
    }
}
