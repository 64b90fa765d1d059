//! Platform alias table.
//!
//! Keys are canonical platform names as written in the ledger (lowercase).
//! Values are the spellings external sources use for the same hardware.
//! Some keys deliberately list a parent platform (e.g. `wiiware` lists
//! `wii`) because catalogs file digital releases under the console.

use std::collections::HashMap;
use std::sync::LazyLock;

const PLATFORM_ALIASES: &[(&str, &[&str])] = &[
    ("3do", &["3do interactive multiplayer"]),
    ("acorn electron", &[]),
    ("amstrad cpc", &["cpc"]),
    ("android", &[]),
    ("apple ii", &["apple iigs"]),
    ("arcade", &["arc", "arcade games", "hyper neo geo 64"]),
    ("atari 2600", &["2600"]),
    ("atari 7800", &["7800"]),
    ("atari 8-bit", &[]),
    ("atari jaguar", &["jaguar", "atari jaguar cd"]),
    ("atari lynx", &["lynx"]),
    ("atari st", &["ast", "st"]),
    ("bbc micro", &["bbc", "bbc microcomputer system"]),
    (
        "bs-x",
        &[
            "satellaview",
            "snes",
            "super nintendo",
            "super nintendo entertainment system",
            "super famicom",
            "sfc",
        ],
    ),
    ("browser", &["web browser", "online/browser", "webonly"]),
    ("colecovision", &[]),
    ("commodore 64", &["c64", "commodore c64/128/max"]),
    ("commodore amiga", &["amiga", "ami"]),
    ("commodore amiga cd32", &["amiga cd32", "cd32", "amiga", "ami"]),
    ("commodore vic-20", &["vic-20", "vic20"]),
    ("dsiware", &["nintendo dsi", "dsi", "ds", "nintendo ds"]),
    ("dedicated console", &["television game", "dedicated", "plug & play"]),
    ("epoch super cassette vision", &["super cassette vision"]),
    ("fm towns", &[]),
    ("fm-7", &["fujitsu fm-7"]),
    ("famicom disk system", &["fds", "family computer disk system"]),
    ("game boy", &["nintendo game boy", "gb"]),
    ("game boy advance", &["nintendo game boy advance", "gba"]),
    ("game boy color", &["nintendo game boy color", "gbc"]),
    ("game.com", &["tiger game.com"]),
    ("gamepark 32", &["gp32"]),
    ("google stadia", &["stadia"]),
    ("intellivision", &[]),
    ("j2me", &["mobile", "mobi", "legacy mobile device"]),
    ("msx", &[]),
    ("msx2", &["msx"]),
    ("mac os", &["macintosh", "mac"]),
    ("n-gage", &["ngage"]),
    ("n-gage 2.0", &["n-gage", "ngage"]),
    ("nec pc-8801", &["pc-8801", "pc", "pc88", "pc-88", "nec pc88", "nec pc-88", "pc-8800 series"]),
    ("nec pc-9801", &["pc-9801", "pc", "pc98", "pc-98", "nec pc98", "nec pc-98", "pc-9800 series"]),
    ("nes", &["famicom", "nintendo entertainment system", "family computer", "nintendo"]),
    ("neo-geo", &["neogeo", "neo geo", "neo", "ng", "neo geo aes", "neo geo mvs"]),
    ("neo-geo cd", &["neogeo", "neo geo", "neogeo cd", "ncd", "ngcd", "neo geo cd"]),
    ("neo-geo pocket", &["ngp", "neogeo pocket", "neo geo pocket"]),
    ("neo-geo pocket color", &["ngpc", "neogeo pocket color", "neo geo pocket color"]),
    ("new nintendo 3ds", &["nintendo 3ds", "3ds"]),
    ("nintendo 3ds", &["3ds", "nintendo 3ds eshop", "3dse"]),
    ("nintendo 64", &["n64"]),
    ("nintendo 64dd", &["64dd", "n64dd"]),
    ("nintendo ds", &["nds", "ds"]),
    ("nintendo dsi", &["dsi"]),
    ("nintendo gamecube", &["gcn", "gamecube", "gc"]),
    ("nintendo pokémon mini", &["pokemon mini", "pokémon mini", "nintendo pokemon mini", "pmini"]),
    ("nintendo switch", &["switch", "ns"]),
    ("nintendo wii", &["wii", "wii shop"]),
    ("nintendo wii u", &["wii u", "wiiu", "wii u eshop", "nintendo wii u eshop"]),
    ("oculus quest", &["oq", "oculus fr"]),
    ("ouya", &[]),
    (
        "pc",
        &[
            "windows pc",
            "windows",
            "dos",
            "pc (microsoft windows)",
            "msdos",
            "ms-dos",
            "steamvr",
        ],
    ),
    ("pc-fx", &["pcfx"]),
    ("pdp-10", &["pdp10", "pc"]),
    ("philips cd-i", &["cdi", "cd-i"]),
    ("pioneer laseractive", &["laseractive"]),
    ("playstation", &["psx", "ps1", "sony playstation", "ps"]),
    ("playstation 2", &["ps2", "sony playstation 2"]),
    ("playstation 3", &["ps3", "sony playstation 3"]),
    ("playstation 4", &["ps4", "sony playstation 4", "playstation vr", "psvr"]),
    ("playstation 5", &["ps5", "sony playstation 5", "playstation vr2", "psvr2"]),
    ("playstation network", &["psn"]),
    ("playstation portable", &["psp"]),
    ("playstation vita", &["psvita", "vita"]),
    ("playdate", &[]),
    ("snes", &["super famicom", "super nintendo entertainment system", "sfc", "super nintendo"]),
    ("sega 32x", &["32x"]),
    ("sega cd", &["scd"]),
    ("sega dreamcast", &["dreamcast", "dcast", "dc"]),
    ("sega game gear", &["gg", "game gear", "gamegear", "sega gamegear"]),
    (
        "sega genesis",
        &[
            "genesis",
            "mega drive",
            "sega mega drive",
            "gen",
            "md",
            "sega mega drive/genesis",
        ],
    ),
    ("sega master system", &["sms", "master system", "sega master system/mark iii"]),
    ("sega sg-1000", &["sg-1000", "sg1000", "sega sg1000"]),
    ("sega saturn", &["saturn", "sat"]),
    ("sharp x1", &["x1"]),
    ("sharp x68000", &["x68000", "x68k", "sharp x68k"]),
    (
        "turbografx-16",
        &[
            "tg16",
            "turbografx16",
            "pce",
            "pc engine",
            "pce engine supergrafx",
            "turbografx-16/pc engine cd",
            "turbografx-16/pc engine",
        ],
    ),
    (
        "turbografx-cd",
        &[
            "tcd",
            "turbo cd",
            "turbo-cd",
            "turbografxcd",
            "pc engine cd-rom",
            "pc engine cd-rom²",
        ],
    ),
    ("vectrex", &[]),
    ("virtual boy", &["vb"]),
    ("watara supervision", &["supervision", "watara/quickshot supervision"]),
    ("wiiware", &["wii", "nintendo wii", "wii shop", "virtual console"]),
    ("wonderswan", &["ws", "bandai wonderswan"]),
    ("wonderswan color", &["wsc", "bandai wonderswan color"]),
    ("xbox", &["xb", "microsoft xbox"]),
    (
        "xbox 360",
        &[
            "360",
            "x360",
            "microsoft xbox 360",
            "xbla",
            "xbox live arcade",
            "xblig",
            "xbox live indie games",
        ],
    ),
    ("xbox one", &["xone", "microsoft xbox one"]),
    (
        "xbox series x|s",
        &[
            "xbox series",
            "xbox series x/s",
            "xbsx",
            "xbox series x",
            "xbox series s",
        ],
    ),
    ("zx spectrum", &["spectrum", "zx", "sinclair zx81/spectrum", "sinclair zx spectrum"]),
    ("zeebo", &[]),
    ("ios", &["iphone", "iphn", "ipad", "ios (iphone/ipad)"]),
];

static ALIAS_INDEX: LazyLock<HashMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| PLATFORM_ALIASES.iter().copied().collect());

/// Known aliases for a ledger platform name, looked up case-insensitively.
/// Returns `None` for platforms missing from the table.
pub fn aliases_for(platform: &str) -> Option<&'static [&'static str]> {
    ALIAS_INDEX.get(platform.trim().to_lowercase().as_str()).copied()
}

/// Every canonical platform name in the table.
pub fn known_platforms() -> impl Iterator<Item = &'static str> {
    PLATFORM_ALIASES.iter().map(|(name, _)| *name)
}
