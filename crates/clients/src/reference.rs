//! Static reference data embedded in the scoring prompt.

/// Estimated semester cost of living by region (USD, zero tuition).
pub const FINANCIAL_REFERENCE_TABLE: &str = "\
| Region | Characterization | Est. Semester Total (USD) |
| :--- | :--- | :--- |
| USA / Australia | High mandatory fees, forced meal plans, expensive insurance/visas. | $11,000 – $15,500 |
| Canada / UK | High rent, but lower insurance/fees than USA. | $8,500 – $11,500 |
| Northern Europe | High rent/groceries, but $0 admin fees and free/subsidized health. | $7,500 – $10,000 |
| Western / Southern Europe | Subsidized transport, lower daily costs for social life. | $5,000 – $8,000 |
| Mexico / Latin America | Campus-style amenities with very cheap local housing/food. | $3,500 – $6,000 |
| East Asia (Japan / Korea) | Subsidized on-campus dorms, cheap \"quick-eat\" culture. | $4,500 – $7,500 |
| China / Taiwan | Ultra-low dorm costs, massive local student subsidies. | $2,500 – $4,500 |
| Eastern Europe | Modern EU infrastructure at the lowest Western prices. | $2,200 – $4,000 |
";

/// Social atmosphere and online sentiment by institution.
pub const SOCIAL_SENTIMENT_TABLE: &str = "\
| University | Primary Social Vibe & Internet Sentiment | Overall Social Level |
| :--- | :--- | :--- |
| ITESM Monterrey | Massive Greek/Club life, wealthy international bubble, huge events. | High |
| University of Oregon | Classic American state school, massive sports/tailgating, frat culture. | High |
| Politecnico di Milano | Massive Erasmus hub, huge international club nights, high ESN traffic. | High |
| Universidad de Palermo | Trendy, design-focused, huge international LatAm footprint, urban. | High |
| McGill University | Work hard / party hard, deeply integrated into Montreal nightlife. | High |
| Concordia University | Relaxed, urban, very social downtown campus, artsy vibe. | High |
| CTU (Prague) | Erasmus goldmine, cheap nightlife, highly social international crowd. | High |
| DTU | Legendary Friday campus bars, very active Scandinavian student life. | High |
| HEC / Ecole Polytechnique | Elite enclosed campus bubbles, massive private galas and BDE parties. | High (Closed) |
| UConn | Big sports culture, rural campus but highly active internal party scene. | High |
| NTU / SKKU | Massive traditional campus festivals, huge club cultures, highly connected. | High |
| Cornell University | Intense academics mixed with massive Greek life; \"Work hard, play hard.\" | Medium/High |
| TUM / TU Berlin | Rigorous tech schools, but saved by world-class city nightlife and Erasmus. | Medium/High |
| UBC / U of Toronto | Huge traffic, but criticized as \"commuter schools.\" Social life requires effort. | Medium |
| RWTH Aachen / KIT | Male-dominated engineering, brutal exams, good local pubs but heavy stress. | Medium |
| Carnegie Mellon (CMU) | Quirky/nerdy culture, high Reddit traffic about \"stress culture\", low partying. | Low/Medium |
| Tsinghua / Peking | Elite, hyper-competitive (\"involution\"). Huge clubs, but intense pressure. | Low/Medium |
| KAIST / POSTECH / USTC | Hardcore STEM pressure cookers. Very little party traffic, heavy lab focus. | Low |
| EPFL | Famous for high failure rates; social life takes a deep backseat to studying. | Low |
| Academia Sinica | Pure research institute, mostly post-grads, almost zero traditional campus life. | Lowest |
";

/// The pair of tables handed to the scoring oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceTables {
    pub financial: &'static str,
    pub social: &'static str,
}

impl ReferenceTables {
    pub fn standard() -> Self {
        Self {
            financial: FINANCIAL_REFERENCE_TABLE,
            social: SOCIAL_SENTIMENT_TABLE,
        }
    }
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::standard()
    }
}
