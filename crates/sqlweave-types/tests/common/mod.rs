//! Shared proptest strategies for data types

use proptest::prelude::*;
use sqlweave_types::DataType;
use sqlweave_types::builder::{
    array, bigint, boolean, char, date, decimal, double, hll, integer, interval_day_to_second,
    interval_year_to_month, ipaddress, json, map, p4hll, real, row, smallint, tdigest, time,
    timestamp, tinyint, unknown, uuid, varbinary, varchar,
};

/// Every non-composite type, with valid parameters
pub fn leaf_type() -> impl Strategy<Value = DataType> {
    prop_oneof![
        Just(boolean()),
        Just(tinyint()),
        Just(smallint()),
        Just(integer()),
        Just(bigint()),
        Just(real()),
        Just(double()),
        Just(varbinary()),
        Just(json()),
        Just(date()),
        Just(ipaddress()),
        Just(uuid()),
        Just(hll()),
        Just(p4hll()),
        Just(tdigest()),
        Just(unknown()),
        Just(interval_year_to_month()),
        Just(interval_day_to_second()),
        (0..=38i64)
            .prop_flat_map(|p| (Just(p), 0..=p))
            .prop_map(|(p, s)| decimal(p, s).unwrap()),
        proptest::option::of(1..200i64).prop_map(varchar),
        (1..200i64).prop_map(|n| char(Some(n))),
        (proptest::option::of(0..=12i64), any::<bool>()).prop_map(|(p, tz)| time(p, tz).unwrap()),
        (proptest::option::of(0..=12i64), any::<bool>())
            .prop_map(|(p, tz)| timestamp(p, tz).unwrap()),
    ]
}

/// Leaf types nested inside ARRAY, MAP and ROW
pub fn any_type() -> impl Strategy<Value = DataType> {
    leaf_type().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(array),
            (inner.clone(), inner.clone()).prop_map(|(k, v)| map(k, v)),
            proptest::collection::vec(inner, 0..4).prop_map(row),
        ]
    })
}
