use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use debtgraph_rs::{Dataset, GraphBuilder, MemoryDriver};

/// `customers` customers with `per_customer` interactions each, cycling
/// through promise, received payment, plan and plain-call shapes.
fn synthetic_dataset(customers: usize, per_customer: usize) -> Dataset {
    let clientes: Vec<_> = (0..customers)
        .map(|c| {
            json!({
                "id": format!("cliente_{c:03}"),
                "nombre": format!("Cliente {c}"),
                "monto_deuda_inicial": 10_000 + c * 250,
                "tipo_deuda": "tarjeta_credito",
                "fecha_prestamo": "2023-06-15"
            })
        })
        .collect();

    let interacciones: Vec<_> = (0..customers * per_customer)
        .map(|i| {
            let mut record = json!({
                "id": format!("int_{i:05}"),
                "cliente_id": format!("cliente_{:03}", i % customers),
                "timestamp": "2024-01-05T10:00:00Z",
                "tipo": "llamada_saliente",
                "agente_id": format!("agente_{:02}", i % 8),
            });
            match i % 4 {
                0 => record["monto_prometido"] = json!(1500),
                1 => {
                    record["tipo"] = json!("pago_recibido");
                    record["monto"] = json!(800);
                }
                2 => record["nuevo_plan_pago"] = json!({"cuotas": 12, "monto_mensual": 900}),
                _ => {}
            }
            record
        })
        .collect();

    serde_json::from_value(json!({"clientes": clientes, "interacciones": interacciones}))
        .expect("synthetic dataset deserializes")
}

fn ingestion_benchmarks(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("ingest_memory");

    for customers in [10, 100, 500] {
        let dataset = synthetic_dataset(customers, 5);
        group.bench_with_input(BenchmarkId::from_parameter(customers), &dataset, |b, dataset| {
            b.to_async(&runtime).iter(|| async {
                let builder = GraphBuilder::new(MemoryDriver::new(), "bench");
                builder.ingest(dataset).await.expect("ingest")
            });
        });
    }
    group.finish();
}

criterion_group!(benches, ingestion_benchmarks);
criterion_main!(benches);
