use std::collections::BTreeMap;

use snowtrip_core::{CatalogData, EntityGroup, GroupMembership, Locale, NamedEntity};

struct ResortSeed {
    id: &'static str,
    zh: &'static str,
    en: &'static str,
    ja: &'static str,
    aliases: &'static [&'static str],
    phonetics: &'static [&'static str],
    region: &'static str,
    area: Option<&'static str>,
    priority: i32,
}

const RESORTS: &[ResortSeed] = &[
    ResortSeed {
        id: "niseko",
        zh: "二世谷",
        en: "Niseko United",
        ja: "ニセコ",
        aliases: &["二世古", "比羅夫", "Grand Hirafu"],
        phonetics: &["niseko", "新雪谷"],
        region: "hokkaido",
        area: Some("niseko"),
        priority: 100,
    },
    ResortSeed {
        id: "rusutsu",
        zh: "留壽都",
        en: "Rusutsu",
        ja: "ルスツ",
        aliases: &["留寿都", "留壽都度假村"],
        phonetics: &["rusutsu"],
        region: "hokkaido",
        area: None,
        priority: 80,
    },
    ResortSeed {
        id: "furano",
        zh: "富良野",
        en: "Furano",
        ja: "富良野",
        aliases: &["富良野滑雪場"],
        phonetics: &["furano"],
        region: "hokkaido",
        area: None,
        priority: 75,
    },
    ResortSeed {
        id: "kiroro",
        zh: "喜樂樂",
        en: "Kiroro",
        ja: "キロロ",
        aliases: &["喜乐乐", "Kiroro Resort"],
        phonetics: &["kiroro"],
        region: "hokkaido",
        area: None,
        priority: 60,
    },
    ResortSeed {
        id: "tomamu",
        zh: "星野TOMAMU",
        en: "Hoshino Resorts Tomamu",
        ja: "星野リゾート トマム",
        aliases: &["Tomamu", "トマム", "星野"],
        phonetics: &["tomamu"],
        region: "hokkaido",
        area: None,
        priority: 55,
    },
    ResortSeed {
        id: "sapporo_teine",
        zh: "札幌手稻",
        en: "Sapporo Teine",
        ja: "サッポロテイネ",
        aliases: &["手稻", "手稲"],
        phonetics: &["teine"],
        region: "hokkaido",
        area: None,
        priority: 40,
    },
    ResortSeed {
        id: "hakuba_happo",
        zh: "白馬八方尾根",
        en: "Hakuba Happo-one",
        ja: "白馬八方尾根",
        aliases: &["白馬八方", "八方尾根", "八方"],
        phonetics: &["hakuba", "happo", "happoone"],
        region: "nagano",
        area: Some("hakuba"),
        priority: 90,
    },
    ResortSeed {
        id: "hakuba_goryu",
        zh: "白馬五龍",
        en: "Hakuba Goryu",
        ja: "白馬五竜",
        aliases: &["五龍", "五竜", "Goryu"],
        phonetics: &["hakuba", "goryu"],
        region: "nagano",
        area: Some("hakuba"),
        priority: 70,
    },
    ResortSeed {
        id: "hakuba_iwatake",
        zh: "白馬岩岳",
        en: "Hakuba Iwatake",
        ja: "白馬岩岳",
        aliases: &["岩岳"],
        phonetics: &["hakuba", "iwatake"],
        region: "nagano",
        area: Some("hakuba"),
        priority: 50,
    },
    ResortSeed {
        id: "tsugaike",
        zh: "栂池高原",
        en: "Tsugaike Kogen",
        ja: "栂池高原",
        aliases: &["白馬栂池", "栂池"],
        phonetics: &["hakuba", "tsugaike"],
        region: "nagano",
        area: Some("hakuba"),
        priority: 45,
    },
    ResortSeed {
        id: "nozawa",
        zh: "野澤溫泉",
        en: "Nozawa Onsen",
        ja: "野沢温泉",
        aliases: &["野澤", "野沢", "野泽温泉", "野泽"],
        phonetics: &["nozawa", "nozawaonsen"],
        region: "nagano",
        area: None,
        priority: 85,
    },
    ResortSeed {
        id: "shiga_kogen",
        zh: "志賀高原",
        en: "Shiga Kogen",
        ja: "志賀高原",
        aliases: &["志贺高原", "志賀"],
        phonetics: &["shiga", "shigakogen"],
        region: "nagano",
        area: None,
        priority: 65,
    },
    ResortSeed {
        id: "karuizawa",
        zh: "輕井澤王子",
        en: "Karuizawa Prince",
        ja: "軽井沢プリンス",
        aliases: &["輕井澤", "軽井沢", "轻井泽"],
        phonetics: &["karuizawa"],
        region: "nagano",
        area: None,
        priority: 35,
    },
    ResortSeed {
        id: "naeba",
        zh: "苗場",
        en: "Naeba",
        ja: "苗場スキー場",
        aliases: &["苗场", "苗場滑雪場"],
        phonetics: &["naeba"],
        region: "niigata",
        area: Some("yuzawa"),
        priority: 72,
    },
    ResortSeed {
        id: "gala_yuzawa",
        zh: "GALA湯澤",
        en: "GALA Yuzawa",
        ja: "ガーラ湯沢",
        aliases: &["GALA", "gala汤泽", "湯沢ガーラ"],
        phonetics: &["galayuzawa"],
        region: "niigata",
        area: Some("yuzawa"),
        priority: 58,
    },
    ResortSeed {
        id: "myoko_akakura",
        zh: "妙高赤倉",
        en: "Myoko Akakura",
        ja: "赤倉温泉",
        aliases: &["赤倉", "赤仓"],
        phonetics: &["akakura"],
        region: "niigata",
        area: Some("myoko"),
        priority: 48,
    },
    ResortSeed {
        id: "lotte_arai",
        zh: "樂天新井",
        en: "Lotte Arai",
        ja: "ロッテアライ",
        aliases: &["新井", "Arai Resort"],
        phonetics: &["arai"],
        region: "niigata",
        area: Some("myoko"),
        priority: 46,
    },
    ResortSeed {
        id: "zao",
        zh: "藏王",
        en: "Zao Onsen",
        ja: "蔵王温泉",
        aliases: &["藏王溫泉", "蔵王"],
        phonetics: &["zao"],
        region: "tohoku",
        area: None,
        priority: 52,
    },
    ResortSeed {
        id: "appi",
        zh: "安比高原",
        en: "APPI Kogen",
        ja: "安比高原",
        aliases: &["安比"],
        phonetics: &["appi"],
        region: "tohoku",
        area: None,
        priority: 44,
    },
];

struct GroupSeed {
    id: &'static str,
    name: &'static str,
    keywords: &'static [&'static str],
    membership: Member,
}

enum Member {
    Region(&'static str),
    Area(&'static str),
}

const GROUPS: &[GroupSeed] = &[
    GroupSeed {
        id: "hakuba",
        name: "白馬",
        keywords: &["白马", "hakuba valley"],
        membership: Member::Area("hakuba"),
    },
    GroupSeed {
        id: "hokkaido",
        name: "北海道",
        keywords: &["hokkaido"],
        membership: Member::Region("hokkaido"),
    },
    GroupSeed {
        id: "nagano",
        name: "長野",
        keywords: &["长野", "nagano"],
        membership: Member::Region("nagano"),
    },
    GroupSeed {
        id: "niigata",
        name: "新潟",
        keywords: &["niigata"],
        membership: Member::Region("niigata"),
    },
    GroupSeed {
        id: "yuzawa",
        name: "湯澤",
        keywords: &["湯沢", "汤泽", "yuzawa"],
        membership: Member::Area("yuzawa"),
    },
    GroupSeed {
        id: "myoko",
        name: "妙高",
        keywords: &["myoko"],
        membership: Member::Area("myoko"),
    },
    GroupSeed {
        id: "tohoku",
        name: "東北",
        keywords: &["东北", "tohoku"],
        membership: Member::Region("tohoku"),
    },
];

/// The resort list shipped with the binary, used when no catalog directory
/// is configured.
pub fn builtin_catalog() -> CatalogData {
    let entities = RESORTS
        .iter()
        .map(|seed| NamedEntity {
            id: seed.id.to_string(),
            names: BTreeMap::from([
                (Locale::ZhTw, seed.zh.to_string()),
                (Locale::En, seed.en.to_string()),
                (Locale::Ja, seed.ja.to_string()),
            ]),
            aliases: seed.aliases.iter().map(|alias| alias.to_string()).collect(),
            phonetics: seed.phonetics.iter().map(|key| key.to_string()).collect(),
            region: seed.region.to_string(),
            area: seed.area.map(str::to_string),
            priority: seed.priority,
        })
        .collect();

    let groups = GROUPS
        .iter()
        .map(|seed| EntityGroup {
            id: seed.id.to_string(),
            name: seed.name.to_string(),
            keywords: seed.keywords.iter().map(|keyword| keyword.to_string()).collect(),
            membership: match seed.membership {
                Member::Region(region) => GroupMembership::Region(region.to_string()),
                Member::Area(area) => GroupMembership::Area(area.to_string()),
            },
        })
        .collect();

    CatalogData { entities, groups }
}
