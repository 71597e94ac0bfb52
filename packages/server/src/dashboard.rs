//! Server-rendered dashboard page.
//!
//! The page is self-contained (inline CSS and JS). Its script posts the
//! filter form to `/api/filtrar_dados`, reloads the map iframe, and fills
//! the neighborhood and month tables from the `GET` endpoints.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use sisagua_analytics_models::{MONTH_NAMES, OverallStats};
use sisagua_map::html::escape;
use sisagua_sample_models::{ALL_FILTER, Parameter, SampleRecord};
use sisagua_server_models::MAP_PATH;

/// Values rendered into the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardPage {
    pub stats: OverallStats,
    pub neighborhoods: Vec<String>,
    pub last_update: String,
    pub error: Option<String>,
}

/// Distinct non-null neighborhoods, sorted.
pub fn sorted_neighborhoods(records: &[SampleRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.neighborhood.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn stat_card(label: &str, value: &str, id: &str) -> String {
    format!(
        r#"<div class="card"><div class="card-label">{label}</div><div class="card-value" id="{id}">{value}</div></div>"#
    )
}

fn options(values: impl IntoIterator<Item = (String, String)>) -> String {
    let mut html = format!("<option value=\"{ALL_FILTER}\">Todos</option>");
    for (value, label) in values {
        let _ = write!(
            html,
            "<option value=\"{}\">{}</option>",
            escape(&value),
            escape(&label)
        );
    }
    html
}

/// Renders the full dashboard page.
#[allow(clippy::too_many_lines)]
pub fn render(page: &DashboardPage) -> String {
    let stats = &page.stats;

    let mut cards = stat_card(
        "Total de amostras",
        &stats.total_samples.to_string(),
        "total_amostras",
    );
    cards.push_str(&stat_card(
        "Bairros",
        &stats.unique_neighborhoods.to_string(),
        "bairros_unicos",
    ));
    cards.push_str(&stat_card(
        "Conformidade geral",
        &format!("{:.1}%", stats.compliance_pct),
        "conformidade_geral",
    ));
    cards.push_str(&stat_card(
        "Não conformidade",
        &format!("{:.1}%", stats.non_compliance_pct),
        "nao_conformidade_geral",
    ));
    for parameter in Parameter::all() {
        cards.push_str(&stat_card(
            parameter.short_label(),
            &format!("{:.1}%", stats.parameters.get(*parameter)),
            &format!("conformidade_{}", parameter.key()),
        ));
    }

    let neighborhood_options = options(
        page.neighborhoods
            .iter()
            .map(|name| (name.clone(), name.clone())),
    );
    let month_options = options(
        MONTH_NAMES
            .iter()
            .zip(1..)
            .map(|(name, month): (&&str, u32)| (month.to_string(), (*name).to_string())),
    );
    let parameter_options = options(
        Parameter::all()
            .iter()
            .map(|parameter| (parameter.to_string(), parameter.to_string())),
    );

    let error_banner = page.error.as_deref().map_or_else(String::new, |message| {
        format!(
            r#"<div class="error-banner">Erro ao carregar dados: {}</div>"#,
            escape(message)
        )
    });

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Dashboard de Qualidade da Água - SISAGUA</title>
    <style>
        body {{ font-family: system-ui, sans-serif; margin: 0; background: #f4f6f8; color: #222; }}
        header {{ background: #0b5394; color: white; padding: 16px 24px; }}
        header small {{ opacity: 0.8; }}
        main {{ padding: 16px 24px; }}
        .error-banner {{ background: #f8d7da; color: #721c24; padding: 12px; border-radius: 6px; margin-bottom: 16px; }}
        .filters {{ display: flex; gap: 12px; flex-wrap: wrap; align-items: end; margin-bottom: 16px; }}
        .filters label {{ display: flex; flex-direction: column; font-size: 12px; }}
        .cards {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(160px, 1fr)); gap: 12px; margin-bottom: 16px; }}
        .card {{ background: white; border-radius: 8px; padding: 12px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }}
        .card-label {{ font-size: 12px; color: #666; }}
        .card-value {{ font-size: 22px; font-weight: bold; }}
        iframe {{ width: 100%; height: 520px; border: 0; border-radius: 8px; background: white; }}
        table {{ width: 100%; border-collapse: collapse; background: white; margin-top: 16px; }}
        th, td {{ padding: 6px 8px; border-bottom: 1px solid #eee; font-size: 13px; text-align: left; }}
    </style>
</head>
<body>
    <header>
        <h1>Qualidade da Água - SISAGUA</h1>
        <small>Última atualização: <span id="ultima_atualizacao">{last_update}</span></small>
    </header>
    <main>
        {error_banner}
        <form class="filters" id="filtros">
            <label>Ano <input name="ano" id="ano" placeholder="{ALL_FILTER}" size="6"></label>
            <label>Mês <select name="mes" id="mes">{month_options}</select></label>
            <label>Bairro <select name="bairro" id="bairro">{neighborhood_options}</select></label>
            <label>Parâmetro <select name="parametro" id="parametro">{parameter_options}</select></label>
            <button type="submit">Filtrar</button>
            <button type="button" id="atualizar">Atualizar dados</button>
        </form>
        <section class="cards">{cards}</section>
        <iframe id="mapa" src="{MAP_PATH}" title="Mapa de coletas"></iframe>
        <table id="tabela_bairros"><thead><tr><th>Bairro</th><th>Análises</th><th>% conforme</th></tr></thead><tbody></tbody></table>
        <table id="tabela_meses"><thead><tr><th>Mês</th><th>Amostras</th><th>% conforme</th></tr></thead><tbody></tbody></table>
    </main>
    <script>
        const pct = (v) => (v === null || v === undefined) ? 'N/A' : v.toFixed(1) + '%';

        function filters() {{
            const ano = document.getElementById('ano').value.trim();
            return {{
                ano: ano === '' ? '{ALL_FILTER}' : ano,
                mes: document.getElementById('mes').value,
                bairro: document.getElementById('bairro').value,
                parametro: document.getElementById('parametro').value,
            }};
        }}

        function fillTable(id, rows, label, total) {{
            const body = document.querySelector('#' + id + ' tbody');
            body.replaceChildren();
            for (const row of rows) {{
                const tr = document.createElement('tr');
                for (const value of [label(row), row[total], pct(row.percentual_conforme)]) {{
                    const td = document.createElement('td');
                    td.textContent = value === null ? 'N/A' : value;
                    tr.appendChild(td);
                }}
                body.appendChild(tr);
            }}
        }}

        async function refresh() {{
            const f = filters();
            const query = new URLSearchParams(f).toString();

            const resp = await fetch('/api/filtrar_dados', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify(f),
            }});
            const stats = await resp.json();
            document.getElementById('total_amostras').textContent = stats.total_amostras;
            document.getElementById('bairros_unicos').textContent = stats.bairros_unicos;
            for (const key of ['conformidade_geral', 'nao_conformidade_geral', 'conformidade_ecoli',
                               'conformidade_coliformes', 'conformidade_turbidez', 'conformidade_cloro',
                               'conformidade_fluoreto']) {{
                document.getElementById(key).textContent = pct(stats[key]);
            }}
            if (stats.map_path) {{
                document.getElementById('mapa').src = stats.map_path + '?t=' + Date.now();
            }}

            const bairros = await (await fetch('/api/bairros?' + query)).json();
            fillTable('tabela_bairros', bairros, (r) => r.bairro, 'total_analises');
            const meses = await (await fetch('/api/distribuicao_mes?' + query)).json();
            fillTable('tabela_meses', meses, (r) => r.nome_mes, 'total_amostras');
        }}

        document.getElementById('filtros').addEventListener('submit', (e) => {{
            e.preventDefault();
            refresh();
        }});

        document.getElementById('atualizar').addEventListener('click', async () => {{
            const resp = await fetch('/atualizar_dados', {{ method: 'POST' }});
            const data = await resp.json();
            if (data.ultima_atualizacao) {{
                document.getElementById('ultima_atualizacao').textContent = data.ultima_atualizacao;
            }}
            refresh();
        }});

        refresh();
    </script>
</body>
</html>"#,
        last_update = escape(&page.last_update),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(error: Option<&str>) -> DashboardPage {
        DashboardPage {
            stats: OverallStats {
                total_samples: 12,
                compliance_pct: 75.0,
                non_compliance_pct: 25.0,
                ..OverallStats::default()
            },
            neighborhoods: vec!["BARRA".to_string(), "<ONDINA>".to_string()],
            last_update: "17/10/2026 09:30".to_string(),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn sorts_and_dedups_neighborhoods() {
        let records: Vec<SampleRecord> = ["ONDINA", "BARRA", "ONDINA"]
            .iter()
            .map(|name| SampleRecord {
                neighborhood: Some((*name).to_string()),
                ..SampleRecord::default()
            })
            .chain(std::iter::once(SampleRecord::default()))
            .collect();
        assert_eq!(sorted_neighborhoods(&records), vec!["BARRA", "ONDINA"]);
    }

    #[test]
    fn renders_stats_and_escaped_options() {
        let html = render(&page(None));
        assert!(html.contains(r#"id="total_amostras">12<"#));
        assert!(html.contains(r#"id="conformidade_geral">75.0%<"#));
        assert!(html.contains("<option value=\"&lt;ONDINA&gt;\">"));
        assert!(html.contains("<option value=\"3\">Março</option>"));
        assert!(html.contains("17/10/2026 09:30"));
        assert!(html.contains(MAP_PATH));
        assert!(!html.contains("error-banner\">"));
    }

    #[test]
    fn renders_error_banner() {
        let html = render(&page(Some("arquivo <ausente>")));
        assert!(html.contains("Erro ao carregar dados: arquivo &lt;ausente&gt;"));
    }
}
