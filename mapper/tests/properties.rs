use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use docshape_core::{
    ArrayDirective, DocumentFormat, EnumType, FieldSpec, ObjectDirective, ScalarConstraint,
    ScalarType, SchemaType,
};
use docshape_mapper::parse;
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

fn everything_schema() -> SchemaType {
    let home = SchemaType::builder("Home", DocumentFormat::Json)
        .field(FieldSpec::scalar("city", ScalarType::String).required())
        .build()
        .unwrap();
    let stats = SchemaType::builder("Stats", DocumentFormat::Json)
        .field(FieldSpec::scalar("visits", ScalarType::Int64).required())
        .field(FieldSpec::scalar("label", ScalarType::String).nullable())
        .build()
        .unwrap();
    let color = EnumType::new("Color", ["Undefined", "Red", "Green", "Blue"]);

    SchemaType::builder("Everything", DocumentFormat::Json)
        .field(FieldSpec::scalar("name", ScalarType::String).required())
        .field(FieldSpec::scalar("count", ScalarType::Int32).required())
        .field(FieldSpec::scalar("big", ScalarType::Int64).required())
        .field(FieldSpec::scalar("price", ScalarType::Decimal).required())
        .field(FieldSpec::scalar("flag", ScalarType::Boolean).required())
        .field(FieldSpec::scalar("color", ScalarType::Enum(color)).required())
        .field(FieldSpec::scalar("contact", ScalarType::Mailbox).required())
        .field(FieldSpec::scalar("born", ScalarType::Date).required())
        .field(FieldSpec::scalar("seen", ScalarType::DateTime).required())
        .field(FieldSpec::scalar("sent", ScalarType::DateTimeOffset).required())
        .field(FieldSpec::scalar("alarm", ScalarType::Time).required())
        .field(FieldSpec::scalar("id", ScalarType::Guid).required())
        .field(FieldSpec::scalar("nickname", ScalarType::String).nullable())
        .field(
            FieldSpec::array_of_scalars("tags", ScalarType::String)
                .array_directive(ArrayDirective::default()),
        )
        .field(FieldSpec::object("home", Arc::new(home)).directive(ObjectDirective::required()))
        .field(
            FieldSpec::embedded("stats", Arc::new(stats)).directive(ObjectDirective::required()),
        )
        .build()
        .unwrap()
}

fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]([a-zA-Z0-9 ]{0,18}[a-zA-Z0-9])?"
}

fn date() -> impl Strategy<Value = NaiveDate> {
    (1900i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn time() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60, 0u32..60, 0u32..1000)
        .prop_map(|(h, m, s, ms)| NaiveTime::from_hms_milli_opt(h, m, s, ms).unwrap())
}

fn date_time() -> impl Strategy<Value = NaiveDateTime> {
    (date(), time()).prop_map(|(d, t)| d.and_time(t))
}

fn document() -> impl Strategy<Value = serde_json::Value> {
    (
        (text(), any::<i32>(), any::<i64>(), -1_000_000_000_000i64..1_000_000_000_000, 0u32..6),
        (any::<bool>(), prop::sample::select(vec!["Red", "Green", "Blue"])),
        ("[a-z]{1,10}(\\.[a-z]{1,5})?", "[a-z]{1,10}\\.(com|org)"),
        (date(), date_time(), date_time(), -720i32..=840, time(), any::<u128>()),
        (prop::option::of(text()), prop::collection::vec(text(), 0..4), text()),
        (any::<i64>(), prop::option::of(text())),
    )
        .prop_map(
            |(
                (name, count, big, mantissa, scale),
                (flag, color),
                (local, domain),
                (born, seen, sent, offset_minutes, alarm, id),
                (nickname, tags, city),
                (visits, label),
            )| {
                let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap();
                let sent = offset.from_utc_datetime(&sent);
                json!({
                    "name": name,
                    "count": count,
                    "big": big,
                    "price": Decimal::new(mantissa, scale).to_string(),
                    "flag": flag,
                    "color": color,
                    "contact": format!("{local}@{domain}"),
                    "born": born.format("%Y-%m-%d").to_string(),
                    "seen": seen.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
                    "sent": sent.to_rfc3339(),
                    "alarm": alarm.format("%H:%M:%S%.f").to_string(),
                    "id": Uuid::from_u128(id).to_string(),
                    "nickname": nickname,
                    "tags": tags,
                    "home": { "city": city },
                    "stats": json!({ "visits": visits, "label": label }).to_string(),
                })
            },
        )
}

proptest! {
    /// A valid result serialized back to JSON parses to the same value.
    #[test]
    fn valid_values_round_trip(doc in document()) {
        let schema = everything_schema();
        let first = parse(&schema, &doc.to_string());
        prop_assert!(first.is_valid(), "{:?}", first.errors);

        let serialized = serde_json::to_string(&first.value).unwrap();
        let second = parse(&schema, &serialized);
        prop_assert!(second.is_valid(), "{:?}", second.errors);
        prop_assert_eq!(first.value, second.value);
    }
}

// ---------------------------------------------------------------------------
// Error completeness
// ---------------------------------------------------------------------------

fn constrained_schema() -> SchemaType {
    SchemaType::builder("Applicant", DocumentFormat::Json)
        .field(
            FieldSpec::scalar("name", ScalarType::String)
                .required()
                .constraint(ScalarConstraint::string(Some(1), Some(50))),
        )
        .field(
            FieldSpec::scalar("age", ScalarType::Int32)
                .required()
                .constraint(ScalarConstraint::integer(Some(0), Some(150))),
        )
        .field(
            FieldSpec::scalar("email", ScalarType::String)
                .required()
                .constraint(ScalarConstraint::email()),
        )
        .field(
            FieldSpec::scalar("score", ScalarType::Decimal)
                .required()
                .constraint(ScalarConstraint::decimal(None, None).with_decimal_digits(None, Some(2))),
        )
        .field(
            FieldSpec::scalar("since", ScalarType::Date)
                .required()
                .constraint(ScalarConstraint::temporal(Some("%Y-%m-%d"))),
        )
        .build()
        .unwrap()
}

proptest! {
    /// Each violated field contributes exactly one error.
    #[test]
    fn one_error_per_violated_field(
        broken in prop::collection::vec(any::<bool>(), 5),
        name in text(),
        age in 0i32..=150,
    ) {
        let name = if broken[0] { String::new() } else { name };
        let age = if broken[1] { 200 } else { age };
        let email = if broken[2] { "not-an-address" } else { "a.b@example.com" };
        let score = if broken[3] { "1.234" } else { "1.23" };
        let since = if broken[4] { "01/02/2024" } else { "2024-01-02" };
        let doc = json!({
            "name": name,
            "age": age,
            "email": email,
            "score": score,
            "since": since,
        });

        let result = parse(&constrained_schema(), &doc.to_string());
        let expected = broken.iter().filter(|b| **b).count();
        prop_assert_eq!(result.errors.len(), expected, "{:?}", result.errors);
    }
}
