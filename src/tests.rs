//! Integration tests for the parts-quotation backend.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::db::{init_database, Repository};
use crate::geo::GeoClient;
use crate::search::SupplierIndex;
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        // Nothing listens on port 9; geography calls fail fast.
        Self::with_geo_base_url("http://127.0.0.1:9".to_string()).await
    }

    async fn with_geo_base_url(geo_base_url: String) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let index_path = temp_dir.path().join("index");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Initialize search index
        let search = Arc::new(SupplierIndex::open(&index_path).expect("Failed to init search"));

        let geo = Arc::new(GeoClient::new(geo_base_url).expect("Failed to build client"));

        let state = AppState { repo, search, geo };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn create_vehicle(&self, plate: &str, brand: &str) -> String {
        let (status, body) = self
            .post_json(
                "/api/vehicles",
                json!({ "plate": plate, "brand": brand, "model": "Onix", "year": 2020 }),
            )
            .await;
        assert_eq!(status, 200, "vehicle create failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn create_supplier(&self, body: Value) -> String {
        let (status, body) = self.post_json("/api/suppliers", body).await;
        assert_eq!(status, 200, "supplier create failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

/// Serve a fixed states/cities payload in the shape the IBGE service uses.
async fn spawn_geo_stub() -> String {
    let app = Router::new()
        .route(
            "/estados",
            get(|| async {
                Json(json!([
                    { "id": 35, "sigla": "SP", "nome": "São Paulo" },
                    { "id": 12, "sigla": "AC", "nome": "Acre" }
                ]))
            }),
        )
        .route(
            "/estados/{uf}/municipios",
            get(|| async {
                Json(json!([
                    { "id": 3550308, "nome": "São Paulo" },
                    { "id": 3509502, "nome": "Campinas" }
                ]))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_revision_increments_on_write() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/revision").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    let before = body["data"]["revisionId"].as_i64().unwrap();

    fixture.create_vehicle("ABC1D23", "Chevrolet").await;

    let (_, body) = fixture.get_json("/api/revision").await;
    let after = body["data"]["revisionId"].as_i64().unwrap();
    assert!(after > before);
    assert_eq!(body["revisionId"].as_i64().unwrap(), after);
}

#[tokio::test]
async fn test_vehicle_crud() {
    let fixture = TestFixture::new().await;

    // Create
    let (status, body) = fixture
        .post_json(
            "/api/vehicles",
            json!({
                "plate": "abc-1d23",
                "brand": "Volkswagen",
                "model": "Gol",
                "year": 2018,
                "color": "Prata"
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["plate"], "ABC1D23");
    let vehicle_id = body["data"]["id"].as_str().unwrap().to_string();
    let revision_after_create = body["revisionId"].as_i64().unwrap();

    // Get
    let (status, body) = fixture
        .get_json(&format!("/api/vehicles/{}", vehicle_id))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["brand"], "Volkswagen");

    // Update only the color
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/vehicles/{}", vehicle_id)))
        .json(&json!({ "color": "Preto" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["color"], "Preto");
    assert_eq!(body["data"]["model"], "Gol");
    assert!(body["revisionId"].as_i64().unwrap() > revision_after_create);

    // Delete
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/vehicles/{}", vehicle_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, body) = fixture
        .get_json(&format!("/api/vehicles/{}", vehicle_id))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_vehicle_validation() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json(
            "/api/vehicles",
            json!({ "plate": "AB12", "brand": "Fiat", "model": "Uno" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = fixture
        .post_json(
            "/api/vehicles",
            json!({ "plate": "ABC1234", "brand": "  ", "model": "Uno" }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = fixture
        .post_json(
            "/api/vehicles",
            json!({ "plate": "ABC1234", "brand": "Fiat", "model": "Uno", "year": 1850 }),
        )
        .await;
    assert_eq!(status, 400);

    // Nothing was written
    let (_, body) = fixture.get_json("/api/vehicles").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_vehicle_list_filters_and_order() {
    let fixture = TestFixture::new().await;

    let first = fixture.create_vehicle("AAA1111", "Fiat").await;
    let second = fixture.create_vehicle("BBB2222", "Ford").await;
    let third = fixture.create_vehicle("CCC3333", "Fiat").await;

    // Newest first by default
    let (_, body) = fixture.get_json("/api/vehicles").await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![third.as_str(), second.as_str(), first.as_str()]);

    let (_, body) = fixture.get_json("/api/vehicles?order=asc").await;
    assert_eq!(body["data"][0]["id"], first.as_str());

    let (_, body) = fixture.get_json("/api/vehicles?brand=fiat").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = fixture.get_json("/api/vehicles?q=bbb2").await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], second.as_str());
}

#[tokio::test]
async fn test_vehicle_delete_conflicts_with_quotation() {
    let fixture = TestFixture::new().await;

    let vehicle_id = fixture.create_vehicle("QWE4R56", "Renault").await;
    let (status, _) = fixture
        .post_json("/api/quotations", json!({ "vehicleId": vehicle_id }))
        .await;
    assert_eq!(status, 200);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/vehicles/{}", vehicle_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_supplier_crud_and_filters() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json(
            "/api/suppliers",
            json!({
                "name": "Auto Peças Paulista",
                "cnpj": "12.345.678/0001-90",
                "phone": "(11) 98765-4321",
                "address": { "city": "Campinas", "state": "sp", "zipCode": "13010-000" },
                "partsType": "genuine",
                "specialization": "bodywork"
            }),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["cnpj"], "12345678000190");
    assert_eq!(body["data"]["address"]["state"], "SP");
    assert_eq!(body["data"]["address"]["zipCode"], "13010000");
    let paulista = body["data"]["id"].as_str().unwrap().to_string();

    let carioca = fixture
        .create_supplier(json!({
            "name": "Rio Vidros",
            "address": { "city": "Rio de Janeiro", "state": "RJ" },
            "specialization": "glass"
        }))
        .await;

    // Defaults applied
    let (_, body) = fixture.get_json(&format!("/api/suppliers/{}", carioca)).await;
    assert_eq!(body["data"]["partsType"], "both");

    // Equality filters
    let (_, body) = fixture.get_json("/api/suppliers?state=sp").await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], paulista.as_str());

    let (_, body) = fixture.get_json("/api/suppliers?specialization=glass").await;
    assert_eq!(body["data"][0]["id"], carioca.as_str());

    // Accent-insensitive text filter
    let (_, body) = fixture.get_json("/api/suppliers?q=pecas").await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], paulista.as_str());

    // Partial update keeps the rest of the address
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/suppliers/{}", paulista)))
        .json(&json!({ "address": { "neighborhood": "Centro" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["address"]["neighborhood"], "Centro");
    assert_eq!(body["data"]["address"]["city"], "Campinas");

    // Invalid state rejected
    let (status, body) = fixture
        .post_json(
            "/api/suppliers",
            json!({ "name": "Nowhere", "address": { "state": "XX" } }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_supplier_csv_import() {
    let fixture = TestFixture::new().await;

    let csv = "Nome,Telefone,Cidade,UF,Tipo de Peças,Especialidade,Observação\n\
               Peças Sul,51 3333-4444,Porto Alegre,rs,Paralela,Funilaria,cliente antigo\n\
               ,11 4444-5555,São Paulo,SP,,,\n\
               Centro Peças,,Curitiba,PR,,,\n\
               Vidraçaria Norte,,Belém,PA,usada,,\n";

    let resp = fixture
        .client
        .post(fixture.url("/api/suppliers/import"))
        .header("content-type", "text/csv")
        .body(csv)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);

    let imported = body["data"]["imported"].as_array().unwrap();
    assert_eq!(imported.len(), 2);
    assert_eq!(imported[0]["name"], "Peças Sul");
    assert_eq!(imported[0]["partsType"], "aftermarket");
    assert_eq!(imported[0]["specialization"], "bodywork");
    assert_eq!(imported[0]["address"]["state"], "RS");
    assert_eq!(imported[1]["name"], "Centro Peças");
    assert_eq!(imported[1]["partsType"], "both");
    assert_eq!(imported[1]["specialization"], "general");

    let skipped = body["data"]["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 2);
    assert_eq!(skipped[0]["line"], 3);
    assert_eq!(skipped[1]["line"], 5);

    assert_eq!(body["data"]["ignoredHeaders"], json!(["Observação"]));

    let (_, body) = fixture.get_json("/api/suppliers").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Imported suppliers are searchable right away
    let (_, body) = fixture.get_json("/api/search?q=curitiba").await;
    assert_eq!(body["data"]["results"][0]["supplier"]["name"], "Centro Peças");
}

#[tokio::test]
async fn test_supplier_csv_import_rejects_unusable_files() {
    let fixture = TestFixture::new().await;

    for csv in ["", "Telefone,Cidade\n1199999999,Santos\n", "Nome,Cidade\n"] {
        let resp = fixture
            .client
            .post(fixture.url("/api/suppliers/import"))
            .body(csv)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "accepted {:?}", csv);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_supplier_cascading_delete() {
    let fixture = TestFixture::new().await;

    let vehicle_id = fixture.create_vehicle("XYZ9A87", "Toyota").await;
    let supplier_id = fixture
        .create_supplier(json!({ "name": "Toyota Peças Genuínas" }))
        .await;
    let other_supplier = fixture.create_supplier(json!({ "name": "Outro" })).await;

    let (_, body) = fixture
        .post_json(
            "/api/quotations",
            json!({
                "vehicleId": vehicle_id,
                "parts": [{ "name": "Farol dianteiro", "quantity": 2 }]
            }),
        )
        .await;
    let quotation_id = body["data"]["id"].as_str().unwrap().to_string();
    let part_id = body["data"]["parts"][0]["id"].as_str().unwrap().to_string();

    for supplier in [&supplier_id, &other_supplier] {
        let (status, _) = fixture
            .post_json(
                &format!("/api/quotations/{}/suppliers", quotation_id),
                json!({ "supplierId": supplier }),
            )
            .await;
        assert_eq!(status, 200);
    }

    let (status, _) = fixture
        .post_json(
            &format!("/api/quotations/{}/offers", quotation_id),
            json!({ "supplierId": supplier_id, "partId": part_id, "price": 450.0, "deliveryDays": 3 }),
        )
        .await;
    assert_eq!(status, 200);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/suppliers/{}", supplier_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["supplierId"], supplier_id.as_str());
    assert_eq!(
        body["data"]["steps"],
        json!([
            { "table": "supplier_offers", "rowsDeleted": 1 },
            { "table": "quotation_suppliers", "rowsDeleted": 1 },
            { "table": "suppliers", "rowsDeleted": 1 }
        ])
    );

    // Dependents are gone, the other supplier's link survives
    let (_, body) = fixture
        .get_json(&format!("/api/quotations/{}/offers", quotation_id))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (_, body) = fixture
        .get_json(&format!("/api/quotations/{}/suppliers", quotation_id))
        .await;
    let links = body["data"].as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["id"], other_supplier.as_str());
    assert_eq!(links[0]["name"], "Outro");

    let (status, _) = fixture
        .get_json(&format!("/api/suppliers/{}", supplier_id))
        .await;
    assert_eq!(status, 404);

    // Deleted supplier no longer comes back from search
    let (_, body) = fixture.get_json("/api/search?q=toyota").await;
    assert_eq!(body["data"]["total"], 0);

    // Deleting again is a not-found
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/suppliers/{}", supplier_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_quotation_crud() {
    let fixture = TestFixture::new().await;

    let vehicle_id = fixture.create_vehicle("JKL5M43", "Honda").await;

    let (status, body) = fixture
        .post_json(
            "/api/quotations",
            json!({
                "vehicleId": vehicle_id,
                "notes": "Colisão traseira",
                "parts": [
                    { "name": "Para-choque traseiro", "quantity": 1, "unitPrice": 800.0 },
                    { "name": "Lanterna", "code": "LT-22", "quantity": 2, "unitPrice": 150.5 },
                    { "name": "Grade" }
                ]
            }),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    let data = &body["data"];
    assert_eq!(data["status"], "pending");
    assert_eq!(data["vehicle"]["plate"], "JKL5M43");
    assert_eq!(data["parts"].as_array().unwrap().len(), 3);
    assert_eq!(data["parts"][2]["quantity"], 1);
    assert_eq!(data["total"].as_f64().unwrap(), 1101.0);
    let quotation_id = data["id"].as_str().unwrap().to_string();

    // Text filter reaches into parts and the embedded vehicle
    let (_, body) = fixture.get_json("/api/quotations?q=lanterna").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = fixture.get_json("/api/quotations?q=honda").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = fixture.get_json("/api/quotations?status=approved").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Replacing the parts list
    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/quotations/{}", quotation_id)))
        .json(&json!({
            "status": "quoted",
            "parts": [{ "name": "Tampa traseira", "quantity": 1, "unitPrice": 1200.0 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "quoted");
    assert_eq!(body["data"]["notes"], "Colisão traseira");
    assert_eq!(body["data"]["parts"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total"].as_f64().unwrap(), 1200.0);

    // Delete
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/quotations/{}", quotation_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, _) = fixture
        .get_json(&format!("/api/quotations/{}", quotation_id))
        .await;
    assert_eq!(status, 404);

    // The vehicle is free to go now
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/vehicles/{}", vehicle_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_quotation_validation() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json("/api/quotations", json!({ "vehicleId": "missing" }))
        .await;
    assert_eq!(status, 400, "{}", body);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let vehicle_id = fixture.create_vehicle("MNO1P23", "Hyundai").await;

    let (status, _) = fixture
        .post_json(
            "/api/quotations",
            json!({ "vehicleId": vehicle_id, "parts": [{ "name": "Capô", "quantity": 0 }] }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = fixture
        .post_json(
            "/api/quotations",
            json!({ "vehicleId": vehicle_id, "parts": [{ "name": "Capô", "unitPrice": -5.0 }] }),
        )
        .await;
    assert_eq!(status, 400);

    let (_, body) = fixture.get_json("/api/quotations").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_quotation_offers_require_invitation() {
    let fixture = TestFixture::new().await;

    let vehicle_id = fixture.create_vehicle("RST2U34", "Nissan").await;
    let supplier_id = fixture.create_supplier(json!({ "name": "Nissan Parts" })).await;
    let cheaper = fixture.create_supplier(json!({ "name": "Barateiro" })).await;

    let (_, body) = fixture
        .post_json(
            "/api/quotations",
            json!({ "vehicleId": vehicle_id, "parts": [{ "name": "Retrovisor" }] }),
        )
        .await;
    let quotation_id = body["data"]["id"].as_str().unwrap().to_string();
    let part_id = body["data"]["parts"][0]["id"].as_str().unwrap().to_string();
    let offers_path = format!("/api/quotations/{}/offers", quotation_id);
    let suppliers_path = format!("/api/quotations/{}/suppliers", quotation_id);

    // Not invited yet
    let (status, _) = fixture
        .post_json(
            &offers_path,
            json!({ "supplierId": supplier_id, "partId": part_id, "price": 300.0 }),
        )
        .await;
    assert_eq!(status, 400);

    // Inviting twice keeps a single link
    for _ in 0..2 {
        let (status, _) = fixture
            .post_json(&suppliers_path, json!({ "supplierId": supplier_id }))
            .await;
        assert_eq!(status, 200);
    }
    fixture
        .post_json(&suppliers_path, json!({ "supplierId": cheaper }))
        .await;
    let (_, body) = fixture.get_json(&suppliers_path).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Unknown part
    let (status, _) = fixture
        .post_json(
            &offers_path,
            json!({ "supplierId": supplier_id, "partId": "nope", "price": 300.0 }),
        )
        .await;
    assert_eq!(status, 400);

    fixture
        .post_json(
            &offers_path,
            json!({ "supplierId": supplier_id, "partId": part_id, "price": 300.0 }),
        )
        .await;
    fixture
        .post_json(
            &offers_path,
            json!({ "supplierId": cheaper, "partId": part_id, "price": 180.0, "deliveryDays": 7 }),
        )
        .await;

    // Cheapest first
    let (_, body) = fixture.get_json(&offers_path).await;
    let offers = body["data"].as_array().unwrap();
    assert_eq!(offers.len(), 2);
    assert_eq!(offers[0]["supplierId"], cheaper.as_str());
    assert_eq!(offers[0]["deliveryDays"], 7);
}

#[tokio::test]
async fn test_workshop_crud() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post_json(
            "/api/workshops",
            json!({ "name": "Funilaria do Zé", "city": "Santos", "state": "SP" }),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    let workshop_id = body["data"]["id"].as_str().unwrap().to_string();

    fixture
        .post_json("/api/workshops", json!({ "name": "Oficina Mineira", "state": "MG" }))
        .await;

    let (_, body) = fixture.get_json("/api/workshops?state=SP").await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], workshop_id.as_str());

    let (_, body) = fixture.get_json("/api/workshops?q=ze").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/workshops/{}", workshop_id)))
        .json(&json!({ "contactName": "José" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["contactName"], "José");
    assert_eq!(body["data"]["city"], "Santos");

    // Referenced by a quotation
    let vehicle_id = fixture.create_vehicle("WSH0P01", "Peugeot").await;
    let (_, body) = fixture
        .post_json(
            "/api/quotations",
            json!({ "vehicleId": vehicle_id, "workshopId": workshop_id }),
        )
        .await;
    let quotation_id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/workshops/{}", workshop_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    fixture
        .client
        .delete(fixture.url(&format!("/api/quotations/{}", quotation_id)))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/workshops/{}", workshop_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_billing_company_crud() {
    let fixture = TestFixture::new().await;

    // CNPJ is mandatory
    let (status, _) = fixture
        .post_json("/api/billing-companies", json!({ "name": "Seguradora", "cnpj": "" }))
        .await;
    assert_eq!(status, 400);

    let (status, body) = fixture
        .post_json(
            "/api/billing-companies",
            json!({
                "name": "Seguradora Confiança",
                "cnpj": "98.765.432/0001-10",
                "email": "financeiro@confianca.com.br",
                "state": "rj"
            }),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["cnpj"], "98765432000110");
    assert_eq!(body["data"]["state"], "RJ");
    let company_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = fixture.get_json("/api/billing-companies?q=confianca").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/billing-companies/{}", company_id)))
        .json(&json!({ "email": "sem-arroba" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/billing-companies/{}", company_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, _) = fixture
        .get_json(&format!("/api/billing-companies/{}", company_id))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_search_suppliers() {
    let fixture = TestFixture::new().await;

    fixture
        .create_supplier(json!({
            "name": "Lataria Express",
            "address": { "city": "Recife", "state": "PE" },
            "specialization": "bodywork"
        }))
        .await;
    fixture
        .create_supplier(json!({
            "name": "Elétrica Total",
            "address": { "city": "Recife", "state": "PE" },
            "specialization": "electrical"
        }))
        .await;

    let (status, body) = fixture.get_json("/api/search?q=eletrica").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["results"][0]["supplier"]["name"], "Elétrica Total");

    let (_, body) = fixture.get_json("/api/search?q=recife&limit=500").await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["limit"], 100);

    let (_, body) = fixture.get_json("/api/search?q=recife&limit=1&offset=1").await;
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn test_search_rejects_deep_offsets_and_tolerates_syntax() {
    let fixture = TestFixture::new().await;

    fixture
        .create_supplier(json!({ "name": "Auto Peças Boa Vista" }))
        .await;

    let (status, body) = fixture.get_json("/api/search?q=auto%20(").await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = fixture.get_json("/api/search?q=auto%3A%22").await;
    assert_eq!(status, 200, "{}", body);

    let (status, body) = fixture
        .get_json("/api/search?q=auto&offset=18446744073709551615")
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = fixture.get_json("/api/search?q=auto&limit=0").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_supplier_contact_link() {
    let fixture = TestFixture::new().await;

    let supplier_id = fixture
        .create_supplier(json!({ "name": "Zap Peças", "phone": "(11) 91234-5678" }))
        .await;
    let silent = fixture.create_supplier(json!({ "name": "Sem Telefone" })).await;

    let (status, body) = fixture
        .get_json(&format!(
            "/api/suppliers/{}/contact-link?message=Ol%C3%A1%20tudo%20bem",
            supplier_id
        ))
        .await;
    assert_eq!(status, 200);
    assert_eq!(
        body["data"]["url"],
        "https://wa.me/5511912345678?text=Ol%C3%A1%20tudo%20bem"
    );

    let (status, body) = fixture
        .get_json(&format!("/api/suppliers/{}/contact-link", silent))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_geo_lookup() {
    let geo_url = spawn_geo_stub().await;
    let fixture = TestFixture::with_geo_base_url(geo_url).await;

    let (status, body) = fixture.get_json("/api/geo/states").await;
    assert_eq!(status, 200);
    let states = body["data"].as_array().unwrap();
    assert_eq!(states.len(), 2);
    assert_eq!(states[0]["uf"], "AC");
    assert_eq!(states[1]["name"], "São Paulo");

    let (status, body) = fixture.get_json("/api/geo/states/sp/cities").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["name"], "Campinas");

    let (status, body) = fixture.get_json("/api/geo/states/ZZ/cities").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_geo_lookup_upstream_failure() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/geo/states").await;
    assert_eq!(status, 502);
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_update_clears_fields_sent_as_null_or_blank() {
    let fixture = TestFixture::new().await;

    let supplier_id = fixture
        .create_supplier(json!({
            "name": "Peças do Porto",
            "phone": "11987654321",
            "email": "porto@pecas.com.br",
            "address": { "city": "Santos", "state": "SP" }
        }))
        .await;
    let supplier_url = fixture.url(&format!("/api/suppliers/{}", supplier_id));

    // Absent fields stay, null clears
    let resp = fixture
        .client
        .put(&supplier_url)
        .json(&json!({ "phone": null, "address": { "city": null } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["phone"].is_null());
    assert_eq!(body["data"]["email"], "porto@pecas.com.br");
    assert!(body["data"]["address"]["city"].is_null());
    assert_eq!(body["data"]["address"]["state"], "SP");

    // Blank clears too
    let resp = fixture
        .client
        .put(&supplier_url)
        .json(&json!({ "email": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, body) = fixture.get_json(&format!("/api/suppliers/{}", supplier_id)).await;
    assert!(body["data"]["email"].is_null());
    assert!(body["data"]["phone"].is_null());
    assert_eq!(body["data"]["name"], "Peças do Porto");

    // Vehicle color and quotation workshop
    let (_, body) = fixture
        .post_json(
            "/api/vehicles",
            json!({ "plate": "CLR0A00", "brand": "Kia", "model": "Rio", "color": "Azul" }),
        )
        .await;
    let vehicle_id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/vehicles/{}", vehicle_id)))
        .json(&json!({ "color": null }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["color"].is_null());
    assert_eq!(body["data"]["model"], "Rio");

    let (_, body) = fixture
        .post_json("/api/workshops", json!({ "name": "Oficina Kia" }))
        .await;
    let workshop_id = body["data"]["id"].as_str().unwrap().to_string();
    let (_, body) = fixture
        .post_json(
            "/api/quotations",
            json!({ "vehicleId": vehicle_id, "workshopId": workshop_id, "notes": "Urgente" }),
        )
        .await;
    let quotation_id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/quotations/{}", quotation_id)))
        .json(&json!({ "workshopId": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["workshopId"].is_null());
    assert_eq!(body["data"]["notes"], "Urgente");

    // The workshop is no longer referenced
    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/workshops/{}", workshop_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
