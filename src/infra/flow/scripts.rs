//! Cadence sources for the FNS scripts and transactions.
//!
//! Contract imports use the `0xDomains`, `0xNonFungibleToken` and
//! `0xFungibleToken` placeholders; `FlowNetworkConfig::resolve_imports`
//! swaps in real addresses before anything is sent.

pub const CHECK_IS_INITIALIZED: &str = r#"
import Domains from 0xDomains
import NonFungibleToken from 0xNonFungibleToken

pub fun main(account: Address): Bool {
    let capability = getAccount(account)
        .getCapability<&Domains.Collection{NonFungibleToken.CollectionPublic, Domains.CollectionPublic}>(Domains.DomainsPublicPath)
    return capability.check()
}
"#;

pub const GET_DOMAIN_INFO_BY_NAME_HASH: &str = r#"
import Domains from 0xDomains
import NonFungibleToken from 0xNonFungibleToken

pub fun main(account: Address, nameHash: String): Domains.DomainInfo? {
    let capability = getAccount(account)
        .getCapability<&Domains.Collection{NonFungibleToken.CollectionPublic, Domains.CollectionPublic}>(Domains.DomainsPublicPath)
    let collection = capability.borrow()
        ?? panic("Collection capability could not be borrowed")

    let id = Domains.nameHashToIDs[nameHash]
    if id == nil {
        return nil
    }

    let domain = collection.borrowDomain(id: id!)
    return domain.getInfo()
}
"#;

pub const GET_RENT_COST: &str = r#"
import Domains from 0xDomains

pub fun main(name: String, duration: UFix64): UFix64 {
    return Domains.getRentCost(name: name, duration: duration)
}
"#;

pub const RENEW_DOMAIN: &str = r#"
import Domains from 0xDomains
import FungibleToken from 0xFungibleToken
import NonFungibleToken from 0xNonFungibleToken

transaction(name: String, duration: UFix64) {
    let vault: @FungibleToken.Vault
    var domain: &{Domains.DomainPrivate}

    prepare(account: AuthAccount) {
        let collectionRef = account.borrow<&{Domains.CollectionPublic}>(from: Domains.DomainsStoragePath)
            ?? panic("Could not borrow collection public")
        var domain: &{Domains.DomainPrivate}? = nil
        let collectionPrivateRef = account.borrow<&{Domains.CollectionPrivate}>(from: Domains.DomainsStoragePath)
            ?? panic("Could not borrow collection private")

        let nameHash = Domains.getDomainNameHash(name: name)
        let domainId = Domains.nameHashToIDs[nameHash]
        let ids = collectionRef.getIDs()

        if domainId == nil {
            panic("You don't own this domain")
        }

        for id in ids {
            if id == domainId! {
                domain = collectionPrivateRef.borrowDomainPrivate(id: id)
            }
        }
        if domain == nil {
            panic("You don't own this domain")
        }
        self.domain = domain!

        let rentCost = Domains.getRentCost(name: name, duration: duration)
        let vaultRef = account.borrow<&FungibleToken.Vault>(from: /storage/flowTokenVault)
            ?? panic("Could not borrow Flow token vault reference")
        self.vault <- vaultRef.withdraw(amount: rentCost)
    }

    execute {
        Domains.renewDomain(domain: self.domain, duration: duration, feeTokens: <- self.vault)
    }
}
"#;

pub const UPDATE_BIO_FOR_DOMAIN: &str = r#"
import Domains from 0xDomains

transaction(nameHash: String, bio: String) {
    var domain: &{Domains.DomainPrivate}

    prepare(account: AuthAccount) {
        var domain: &{Domains.DomainPrivate}? = nil
        let collectionPvt = account.borrow<&{Domains.CollectionPrivate}>(from: Domains.DomainsStoragePath)
            ?? panic("Could not load collection private")

        let id = Domains.nameHashToIDs[nameHash]
            ?? panic("Could not find domain")

        domain = collectionPvt.borrowDomainPrivate(id: id)
        self.domain = domain!
    }

    execute {
        self.domain.setBio(bio: bio)
    }
}
"#;

pub const UPDATE_ADDRESS_FOR_DOMAIN: &str = r#"
import Domains from 0xDomains

transaction(nameHash: String, addr: Address) {
    var domain: &{Domains.DomainPrivate}

    prepare(account: AuthAccount) {
        var domain: &{Domains.DomainPrivate}? = nil
        let collectionPvt = account.borrow<&{Domains.CollectionPrivate}>(from: Domains.DomainsStoragePath)
            ?? panic("Could not load collection private")

        let id = Domains.nameHashToIDs[nameHash]
            ?? panic("Could not find domain")

        domain = collectionPvt.borrowDomainPrivate(id: id)
        self.domain = domain!
    }

    execute {
        self.domain.setAddress(addr: addr)
    }
}
"#;
